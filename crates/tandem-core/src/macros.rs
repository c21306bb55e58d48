/// Builds a [`Record`](crate::stmt::Record) from `field => value` pairs.
///
/// ```
/// let record = tandem_core::record! { "status" => "DONE", "total" => 3 };
/// assert_eq!(record.len(), 2);
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::stmt::Record::new()
    };
    (
        $( $field:expr => $value:expr ),+ $(,)?
    ) => {{
        let mut record = $crate::stmt::Record::new();
        $( record.insert($field, $value); )+
        record
    }};
}
