use super::result_set::ResultSet;

/// Every result set produced by one command, in the order the server returned them.
#[derive(Debug, Clone, Default)]
pub struct DataSet {
    pub tables: Vec<ResultSet>,
}

impl DataSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, table: ResultSet) {
        self.tables.push(table);
    }

    /// The first table, which is the only one for single-statement commands.
    #[must_use]
    pub fn table(&self) -> Option<&ResultSet> {
        self.tables.first()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl From<ResultSet> for DataSet {
    fn from(table: ResultSet) -> Self {
        Self {
            tables: vec![table],
        }
    }
}
