/// A file found in the index together with its reconstructed path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLocation {
    pub id: u64,
    pub path: String,
}
