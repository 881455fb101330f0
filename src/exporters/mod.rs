pub mod csv;

pub use csv::CsvConverter;
