//! Local known-address labels.

use std::collections::HashMap;
use std::path::Path;

use alloy::primitives::Address;
use serde::Deserialize;
use tracing::info;

/// Labels for locally known addresses, loaded from a CSV file with
/// `address,label` records. Lookup is by parsed address value, so case
/// differences in the CSV are irrelevant.
#[derive(Debug, Default, Clone)]
pub struct AddressBook {
    labels: HashMap<Address, String>,
}

#[derive(Deserialize)]
struct AddressRecord {
    address: Address,
    label: String,
}

impl AddressBook {
    /// Load labels from a CSV file.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let mut reader = csv::Reader::from_path(&path)?;

        let mut labels = HashMap::new();
        for result in reader.deserialize() {
            let record: AddressRecord = result?;
            labels.insert(record.address, record.label);
        }

        info!("Loaded {} address-book entries", labels.len());
        Ok(Self { labels })
    }

    /// Label for the address, if one is known locally.
    pub fn label(&self, address: &Address) -> Option<&str> {
        self.labels.get(address).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
