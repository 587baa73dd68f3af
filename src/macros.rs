/// Builds a [`Compound`](crate::Compound) from `id => value` pairs.
///
/// Values go through [`Value::from`](crate::Value), so integers must be
/// typed (`42u64`, `-7i64`); string literals, `String`s, nested compounds
/// and the supported `Vec` list types all work directly.
///
/// # Examples
///
/// ```rust
/// use lostthing::compound;
///
/// let record = compound! {
///     1 => 42u64,
///     2 => "hello",
///     3 => compound! { 1 => -7i64 },
/// };
/// assert_eq!(record.len(), 3);
/// ```
#[macro_export]
macro_rules! compound {
    () => {
        $crate::Compound::new()
    };

    ( $($id:expr => $value:expr),+ $(,)? ) => {{
        let mut compound = $crate::Compound::new();
        $(
            compound.insert($id, $crate::Value::from($value));
        )+
        compound
    }};
}
