//! Macro for convenient Cypher query construction.

/// Shorthand for `executor.query(..)` followed by one `.param(..)` per
/// `name = value` pair.
///
/// ```ignore
/// use sbmlgraph::cypher;
///
/// let rows = cypher!(graph, "MATCH (n {tag: $tag}) RETURN n.uid AS uid", tag = tag)
///     .fetch_all()
///     .await?;
/// ```
#[macro_export]
macro_rules! cypher {
    // Query without parameters
    ($graph:expr, $query:expr) => {
        $graph.query($query)
    };
    // Query with parameters
    ($graph:expr, $query:expr, $($name:ident = $value:expr),+ $(,)?) => {
        $graph.query($query)$(.param(stringify!($name), $value))+
    };
}
