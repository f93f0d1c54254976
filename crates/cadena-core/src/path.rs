//! Sample format conversion path search.
//!
//! The search graph has one node per (sample format, filter) pair: the format
//! a stream has after passing through that filter. An edge leads from any
//! node at format `X` to node `(Y, F)` when filter `F` declares it converts
//! `X` into `Y`. Every edge costs one hop.
//!
//! Only the first hop of the cheapest path is returned. The negotiator
//! inserts that filter and searches again from the intermediate format, so
//! multi-hop paths are built one filter at a time.

use crate::format::SampleFormat;
use crate::registry::FilterRegistry;

/// First hop of a conversion path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionStep {
    /// Registry index of the filter to insert.
    pub filter: usize,
    /// Format that filter should produce.
    pub format: SampleFormat,
}

/// Finds the first filter on the shortest conversion path from `from` to
/// `to`.
///
/// Ties between equally short paths go to the lowest (format, filter) index,
/// so the answer depends only on the inputs and the registry order. Returns
/// `None` if `to` is unreachable or `from == to`.
pub fn find_conversion(
    registry: &FilterRegistry,
    from: SampleFormat,
    to: SampleFormat,
) -> Option<ConversionStep> {
    if from == to {
        return None;
    }
    let num_filters = registry.len();
    let num_formats = SampleFormat::ALL.len();
    let num_nodes = num_formats.checked_mul(num_filters)?;
    if num_nodes == 0 {
        return None;
    }

    let node = |format: SampleFormat, filter: usize| format.index() * num_filters + filter;
    let format_of = |n: usize| SampleFormat::ALL[n / num_filters];

    let mut dist: Vec<Option<u32>> = vec![None; num_nodes];
    let mut prev: Vec<Option<usize>> = vec![None; num_nodes];
    let mut visited = vec![false; num_nodes];

    for filter in 0..num_filters {
        dist[node(from, filter)] = Some(0);
    }

    loop {
        // Unvisited node with minimal distance, lowest index first.
        let mut current: Option<(usize, u32)> = None;
        for (n, d) in dist.iter().enumerate() {
            if let Some(d) = *d
                && !visited[n]
                && current.is_none_or(|(_, best)| d < best)
            {
                current = Some((n, d));
            }
        }
        let (cur, cur_dist) = current?;
        visited[cur] = true;

        let cur_format = format_of(cur);
        if cur_format == to {
            return first_hop(&prev, cur).map(|hop| ConversionStep {
                filter: hop % num_filters,
                format: format_of(hop),
            });
        }

        let next_dist = cur_dist.checked_add(1)?;
        for format in SampleFormat::ALL {
            if format == cur_format {
                continue;
            }
            for filter in 0..num_filters {
                let converts = registry
                    .info(filter)
                    .is_some_and(|info| info.converts(cur_format, format));
                if !converts {
                    continue;
                }
                let n = node(format, filter);
                if !visited[n] && dist[n].is_none_or(|d| next_dist < d) {
                    dist[n] = Some(next_dist);
                    prev[n] = Some(cur);
                }
            }
        }
    }
}

/// Walks back from `end` to the node right after a start node.
fn first_hop(prev: &[Option<usize>], end: usize) -> Option<usize> {
    let mut n = end;
    let mut p = prev[n]?;
    while let Some(pp) = prev[p] {
        n = p;
        p = pp;
    }
    Some(n)
}
