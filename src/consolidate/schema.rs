pub const COLUMN_COUNT: usize = 23;

pub const DEFAULT_PACKAGE_NAME: &str = "Reactive";

/// One value per schema column, in schema order. `None` is an empty cell.
pub type NormalizedRow = [Option<String>; COLUMN_COUNT];

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Column {
    AttemptNumber,
    InspectionVideos,
    UpstreamManhole,
    DownstreamManhole,
    InspectionDirection,
    InspectionDate,
    InspectionTime,
    PackageName,
    Cleaning,
    InspectedLength,
    PipeAssetId,
    WorkOrder,
    ChildWorkOrder,
    GeneralComment,
    SectionPdf,
    Address,
    Suburb,
    ClientDefined2,
    WorkOrderDescription,
    LocationScamp,
    PriorityJustification,
    OperationalArea,
    TaskCode,
}

impl Column {
    pub const ALL: [Column; COLUMN_COUNT] = [
        Self::AttemptNumber,
        Self::InspectionVideos,
        Self::UpstreamManhole,
        Self::DownstreamManhole,
        Self::InspectionDirection,
        Self::InspectionDate,
        Self::InspectionTime,
        Self::PackageName,
        Self::Cleaning,
        Self::InspectedLength,
        Self::PipeAssetId,
        Self::WorkOrder,
        Self::ChildWorkOrder,
        Self::GeneralComment,
        Self::SectionPdf,
        Self::Address,
        Self::Suburb,
        Self::ClientDefined2,
        Self::WorkOrderDescription,
        Self::LocationScamp,
        Self::PriorityJustification,
        Self::OperationalArea,
        Self::TaskCode,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn header(self) -> &'static str {
        match self {
            Self::AttemptNumber => "Attempt #",
            Self::InspectionVideos => "Inspection Video(s)",
            Self::UpstreamManhole => "US MH",
            Self::DownstreamManhole => "DS MH",
            Self::InspectionDirection => "Inspection Direction",
            Self::InspectionDate => "Date of inspection",
            Self::InspectionTime => "Time of inspection",
            Self::PackageName => "PackageName",
            Self::Cleaning => "Cleaning",
            Self::InspectedLength => "Inspected Length [m]",
            Self::PipeAssetId => "Pipe Asset ID",
            Self::WorkOrder => "JSA/WO",
            Self::ChildWorkOrder => "Child WO",
            Self::GeneralComment => "General comment",
            Self::SectionPdf => "Section PDF Filename",
            Self::Address => "Address/Location",
            Self::Suburb => "Suburb",
            Self::ClientDefined2 => "Client Defined 2",
            Self::WorkOrderDescription => "WO description",
            Self::LocationScamp => "Location Scamp",
            Self::PriorityJustification => "Priority Justification",
            Self::OperationalArea => "Operational Area",
            Self::TaskCode => "Task code",
        }
    }

    /// Columns that decide whether a source row is blank. Derived or
    /// defaulted columns never count.
    pub fn is_tracked(self) -> bool {
        !matches!(
            self,
            Self::InspectedLength
                | Self::SectionPdf
                | Self::WorkOrder
                | Self::PackageName
                | Self::GeneralComment
        )
    }
}

pub fn headers() -> Vec<&'static str> {
    Column::ALL.iter().map(|column| column.header()).collect()
}

pub fn empty_row() -> NormalizedRow {
    std::array::from_fn(|_| None)
}

/// Positional truncation of a source row onto the schema. Source cells past
/// the last schema column are ignored; schema columns past the end of the
/// source stay empty. Whitespace-only cells count as empty.
pub fn positional_row(source: &[Option<String>]) -> NormalizedRow {
    let mut row = empty_row();
    for (slot, value) in row.iter_mut().zip(source) {
        *slot = value
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .map(ToOwned::to_owned);
    }
    row
}

/// Maps a contractor sheet row onto the schema.
///
/// Contractor sheets carry the package name and the general comment in each
/// other's positions. The straight-mapped package slot is defaulted first,
/// then the two slots are exchanged.
pub fn reconcile_row(source: &[Option<String>]) -> NormalizedRow {
    let mut row = positional_row(source);

    let package = &mut row[Column::PackageName.index()];
    if package.is_none() {
        *package = Some(DEFAULT_PACKAGE_NAME.to_string());
    }

    row.swap(Column::PackageName.index(), Column::GeneralComment.index());
    row
}

/// A row is blank when no tracked column holds a value. An inspected length
/// alone still marks a real inspection attempt and keeps the row.
pub fn is_blank_row(row: &NormalizedRow) -> bool {
    row[Column::InspectedLength.index()].is_none()
        && Column::ALL
            .iter()
            .filter(|column| column.is_tracked())
            .all(|column| row[column.index()].is_none())
}
