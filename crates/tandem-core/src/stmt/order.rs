/// Sort direction of a query.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn is_asc(self) -> bool {
        matches!(self, Direction::Asc)
    }
}

impl std::str::FromStr for Direction {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Direction> {
        match s {
            "asc" | "ASC" => Ok(Direction::Asc),
            "desc" | "DESC" => Ok(Direction::Desc),
            _ => Err(crate::Error::invalid_argument(format!(
                "order must be \"asc\" or \"desc\"; got {s:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn new(column: impl Into<String>, direction: Direction) -> OrderBy {
        OrderBy {
            column: column.into(),
            direction,
        }
    }
}
