pub mod xlsx_report;
