use synoptic_parser::{SampleRow, SampleTable, SiteId};
use tracing::debug;

/// Site discontinued partway through the study.
pub const DEFAULT_EXCLUDED_SITE: &str = "MC04";

/// Anything that belongs to a single sampling site.
pub trait SiteKeyed {
    fn site(&self) -> &SiteId;
}

impl SiteKeyed for SampleRow {
    fn site(&self) -> &SiteId {
        &self.site
    }
}

/// Returns the rows whose site is not `excluded`, preserving order.
pub fn without_site<T: SiteKeyed + Clone>(rows: &[T], excluded: &SiteId) -> Vec<T> {
    rows.iter()
        .filter(|row| row.site() != excluded)
        .cloned()
        .collect()
}

pub fn exclude_site(table: &SampleTable, excluded: &SiteId) -> SampleTable {
    let rows = without_site(&table.rows, excluded);
    debug!(
        table = table.kind.name(),
        site = %excluded,
        removed = table.rows.len() - rows.len(),
        "excluded site rows"
    );
    SampleTable::new(table.kind, rows)
}
