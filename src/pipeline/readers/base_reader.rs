use crate::error::Result;

pub trait BaseReader {
    type Record;

    fn read_records(&self) -> Result<Box<dyn Iterator<Item = Result<Self::Record>>>>;

    /// Reads every record, failing on the first malformed one.
    fn read_all(&self) -> Result<Vec<Self::Record>> {
        self.read_records()?.collect()
    }
}
