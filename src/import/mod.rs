mod csv_import;
mod export;

pub(crate) use csv_import::CsvImporter;
pub(crate) use export::export_to_csv;
