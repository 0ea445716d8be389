//! Macros for ergonomic graph construction.

/// Declare a state graph and get an [`EngineBuilder`](crate::builder::EngineBuilder).
///
/// # Example
///
/// ```
/// use waypoint::graph;
///
/// let engine = graph! {
///     initial: "A",
///     "A" => ["B"],
///     "B" => ["A", "C"],
///     "C" => [],
/// }
/// .build()
/// .unwrap();
///
/// assert_eq!(engine.current_name(), "A");
/// assert_eq!(engine.registry().len(), 3);
/// ```
#[macro_export]
macro_rules! graph {
    (
        initial: $initial:expr,
        $(
            $name:expr => [$($target:expr),* $(,)?]
        ),* $(,)?
    ) => {
        $crate::builder::EngineBuilder::new()
            .initial($initial)
            $(
                .state($crate::core::StateDefinition::new($name)$(.to($target))*)
            )*
    };
}
