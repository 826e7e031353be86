use crate::error::Result;

/// Trait for writing batches of records to an output sink (e.g. file).
pub trait BaseWriter<T> {
    /// Write a batch of records to the sink.
    fn write_batch(&mut self, records: &[T]) -> Result<()>;

    /// Finalize and close the output writer.
    fn close(self) -> Result<()>;
}
