mod common;
mod end_to_end;
mod fields;
mod oracle_failures;
mod parallel;
mod properties;
