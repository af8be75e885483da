pub mod archive_service;
pub mod date_axis;
pub mod dimension_registry;
pub mod member_filter;
pub mod scan_service;
pub mod template_composer;
pub mod validation_service;
pub mod workbook_builder;

pub use archive_service::ProjectArchiver;
pub use date_axis::{CsvVersionSource, DateAxisResolver, VersionRangeSource};
pub use dimension_registry::DimensionRegistry;
pub use member_filter::{Member, ResolvedMemberSet};
pub use template_composer::{GenerateOutcome, TemplateComposer};
pub use validation_service::{ValidationEngine, ValidationReport};
pub use workbook_builder::WorkbookBuilder;
