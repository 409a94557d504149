use crate::registry::BackendHandle;
use crate::ui::Icons;
use tabled::{Table, Tabled, settings::Style};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Field")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn stats_table(stats: &[(&str, &str)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

#[derive(Tabled)]
struct ProviderRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Default")]
    default: String,
}

pub fn providers_table(handles: &[BackendHandle]) -> String {
    let rows: Vec<ProviderRow> = handles
        .iter()
        .map(|handle| {
            let info = handle.backend.connection_info();
            ProviderRow {
                name: handle.logical_name.clone(),
                kind: info.kind().to_string(),
                location: info.location(),
                default: if handle.is_default { Icons::STAR.to_string() } else { String::new() },
            }
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}
