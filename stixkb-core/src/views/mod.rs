pub mod colors;
pub mod distribution_pie;
pub mod external_references;
pub mod paging;
pub mod relationship_lines;

pub use distribution_pie::{DistributionPie, PieContent, PieSlice, PieVariant, ReconfigureAction};
pub use external_references::{
    ExternalReferenceRow, ExternalReferencesLoadMore, ExternalReferencesOptions,
    ExternalReferencesPagination, ExternalReferencesPanel,
};
pub use paging::{CumulativePages, LoadMoreMode, PageWindow, PanelRow};
pub use relationship_lines::{
    LineRow, LinesOptions, LinesPagination, LoadMoreRequest, QueryState, RelationshipLines,
};
