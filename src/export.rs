//! N-Triples export: serialize a graph as one line per triple.
//!
//! ```text
//! Graph → export_ntriples() → <s> <p> "o"@en .
//!   → feed to any RDF toolchain, or back into load_ntriples()
//! ```

use std::io::Write;

use tracing::debug;

use crate::storage::Graph;
use crate::Result;

/// Write every triple of `graph` to `writer` in N-Triples syntax.
///
/// Line order follows the index traversal and is not stable across runs.
/// Returns the number of lines written.
pub async fn export_ntriples<G: Graph + ?Sized>(graph: &G, writer: &mut dyn Write) -> Result<usize> {
    let mut triples = graph.triples().await;
    let mut count = 0;
    while let Some(triple) = triples.next().await {
        writeln!(writer, "{} .", triple?)?;
        count += 1;
    }
    writer.flush()?;
    debug!(count, "exported N-Triples");
    Ok(count)
}
