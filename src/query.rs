//! Filtering and sorting of a `GroupedIndex` against the current `QueryParams`

use crate::index::{GenderBuckets, GroupedIndex};
use crate::params::QueryParams;
use crate::record::{Gender, Record};
use serde::Serialize;

/// One displayable (discipline, gender) table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupView<'a> {
    pub discipline: &'a str,
    pub gender: Gender,
    /// Matching records, highest score first
    pub records: Vec<&'a Record>,
}

/// The non-empty tables of one discipline, Male first
#[derive(Debug, Clone, PartialEq)]
pub struct DisciplineView<'a> {
    pub discipline: &'a str,
    pub groups: Vec<GroupView<'a>>,
}

/// Run a query against the index.
///
/// With a selection, disciplines come out in selection order and unknown
/// names produce nothing. Without one, every discipline is considered in
/// index order. Empty (discipline, gender) tables are omitted. The index is
/// only read.
pub fn query<'a>(index: &'a GroupedIndex, params: &QueryParams) -> Vec<GroupView<'a>> {
    let candidates: Vec<(&'a str, &'a GenderBuckets)> = if params.selected().is_empty() {
        index.iter().collect()
    } else {
        params
            .selected()
            .iter()
            .filter_map(|name| index.get_key_value(name))
            .collect()
    };

    let mut views = Vec::new();
    for (discipline, buckets) in candidates {
        for gender in Gender::ALL {
            let records = filter_and_sort(buckets.get(gender), params.points());
            if !records.is_empty() {
                views.push(GroupView {
                    discipline,
                    gender,
                    records,
                });
            }
        }
    }
    views
}

/// Keep records matching the point filter, then order by score descending.
/// `sort_by` is stable, so equal scores keep their input order.
fn filter_and_sort(records: &[Record], points: Option<i64>) -> Vec<&Record> {
    let mut kept: Vec<&Record> = records
        .iter()
        .filter(|r| points.is_none_or(|p| r.score == p))
        .collect();
    kept.sort_by(|a, b| b.score.cmp(&a.score));
    kept
}

/// Regroup flat query output by discipline, preserving order.
pub fn grouped<'a>(views: Vec<GroupView<'a>>) -> Vec<DisciplineView<'a>> {
    let mut out: Vec<DisciplineView<'a>> = Vec::new();
    for view in views {
        match out.last_mut() {
            Some(last) if last.discipline == view.discipline => last.groups.push(view),
            _ => out.push(DisciplineView {
                discipline: view.discipline,
                groups: vec![view],
            }),
        }
    }
    out
}
