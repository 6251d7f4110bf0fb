//! Date roles: how a calendar date maps onto the element names of a
//! time dimension.

use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateRole {
    Year,
    IsoYear,
    Month,
    IsoWeek,
    /// 1 = Monday .. 7 = Sunday
    Weekday,
    Day,
}

impl DateRole {
    /// Element name for `date` in a dimension playing this role.
    pub fn project(self, date: NaiveDate) -> String {
        match self {
            DateRole::Year => date.year().to_string(),
            DateRole::IsoYear => date.iso_week().year().to_string(),
            DateRole::Month => format!("{:02}", date.month()),
            DateRole::IsoWeek => format!("{:02}", date.iso_week().week()),
            DateRole::Weekday => date.weekday().number_from_monday().to_string(),
            DateRole::Day => format!("{:02}", date.day()),
        }
    }
}

impl FromStr for DateRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "year" => Ok(DateRole::Year),
            "isoyear" => Ok(DateRole::IsoYear),
            "month" => Ok(DateRole::Month),
            "isoweek" => Ok(DateRole::IsoWeek),
            "weekday" => Ok(DateRole::Weekday),
            "day" => Ok(DateRole::Day),
            other => Err(other.to_string()),
        }
    }
}
