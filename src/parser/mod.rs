//! N-Triples ingestion.

pub mod ntriples;

use std::io::BufRead;

use tracing::debug;

use crate::storage::Graph;
use crate::Result;

pub use ntriples::{parse_line, NTriplesReader};

/// Parse N-Triples from `reader` and add every triple to `graph`.
///
/// Stops at the first syntax or I/O error; triples added before it stay in
/// the graph. Returns the number of triples read.
pub async fn load_ntriples<G, R>(graph: &G, reader: R) -> Result<usize>
where
    G: Graph + ?Sized,
    R: BufRead,
{
    let mut count = 0;
    for triple in NTriplesReader::new(reader) {
        graph.add(triple?).await?;
        count += 1;
    }
    debug!(count, "loaded N-Triples");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::HdtGraph;
    use crate::Error;

    const DATA: &str = "\
<http://ex.org/alice> <http://ex.org/knows> <http://ex.org/bob> .
<http://ex.org/alice> <http://ex.org/name> \"Alice\"@en .
# repeated line
<http://ex.org/alice> <http://ex.org/knows> <http://ex.org/bob> .
";

    #[tokio::test]
    async fn test_load_counts_lines_not_distinct_triples() {
        let graph = HdtGraph::new();
        assert_eq!(load_ntriples(&graph, DATA.as_bytes()).await.unwrap(), 3);
        assert_eq!(graph.len().await, 2);
    }

    #[tokio::test]
    async fn test_load_stops_at_syntax_error() {
        let graph = HdtGraph::new();
        let input = "<a:s> <a:p> <a:o> .\n<a:s> <a:p> .\n<a:s> <a:p> <a:x> .\n";
        match load_ntriples(&graph, input.as_bytes()).await {
            Err(Error::Syntax { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected syntax error, got {other:?}"),
        }
        assert_eq!(graph.len().await, 1);
    }
}
