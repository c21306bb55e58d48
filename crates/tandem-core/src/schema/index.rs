/// A named composite index: an ordered list of partition-key segments and
/// an ordered list of sort-key segments, all attribute names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,

    /// True for the index that addresses a record by its identity.
    pub primary: bool,

    /// Partition key segments.
    pub pk: Vec<String>,

    /// Sort key segments.
    pub sk: Vec<String>,
}

impl Index {
    pub fn new<P, S>(
        name: impl Into<String>,
        pk: impl IntoIterator<Item = P>,
        sk: impl IntoIterator<Item = S>,
    ) -> Index
    where
        P: Into<String>,
        S: Into<String>,
    {
        Index {
            name: name.into(),
            primary: false,
            pk: pk.into_iter().map(Into::into).collect(),
            sk: sk.into_iter().map(Into::into).collect(),
        }
    }

    /// A primary index with no sort segments.
    pub fn primary<P: Into<String>>(
        name: impl Into<String>,
        pk: impl IntoIterator<Item = P>,
    ) -> Index {
        Index {
            primary: true,
            ..Index::new(name, pk, Vec::<String>::new())
        }
    }

    /// Marks the index as primary.
    pub fn into_primary(mut self) -> Index {
        self.primary = true;
        self
    }

    /// Partition segments followed by sort segments.
    pub fn key_fields(&self) -> impl Iterator<Item = &str> + '_ {
        self.pk.iter().chain(self.sk.iter()).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.key_fields().any(|f| f == field)
    }
}
