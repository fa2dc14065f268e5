use super::record::{InspectionRecord, cmp_timestamps};

/// The consolidated inspection rows of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsolidatedTable {
    records: Vec<InspectionRecord>,
}

impl ConsolidatedTable {
    pub fn from_records(records: Vec<InspectionRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[InspectionRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<InspectionRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Orders by work order, then inspection date and time. The sort is
    /// stable, so rows with equal keys keep their merge order.
    pub fn sort_ascending(&mut self) {
        self.records.sort_by(|left, right| {
            left.work_order()
                .cmp(right.work_order())
                .then_with(|| cmp_timestamps(left.timestamp(), right.timestamp()))
        });
    }

    pub fn work_order_count(&self) -> usize {
        let mut work_orders: Vec<&str> = self.records.iter().map(|r| r.work_order()).collect();
        work_orders.sort_unstable();
        work_orders.dedup();
        work_orders.len()
    }
}
