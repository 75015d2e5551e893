mod calendar;
mod common;
mod eligibility;
