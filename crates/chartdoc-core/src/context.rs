//! Documentation rendering context

use serde::Serialize;

use crate::chart::ChartManifest;
use crate::rows::{ValueRow, ValueSections, group_sections};

/// Everything a documentation template sees for one chart
#[derive(Debug, Clone, Serialize)]
pub struct ChartDoc {
    /// Manifest fields (`chart.name`, `chart.appVersion`, ...)
    pub chart: ChartManifest,

    /// Value rows in output order
    pub values: Vec<ValueRow>,

    /// The same rows grouped by `@section`
    pub sections: ValueSections,
}

impl ChartDoc {
    pub fn new(chart: ChartManifest, values: Vec<ValueRow>) -> Self {
        let sections = group_sections(&values);
        Self {
            chart,
            values,
            sections,
        }
    }
}
