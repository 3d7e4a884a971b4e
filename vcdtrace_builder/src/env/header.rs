//! The static part of the VCD header: `$date`, `$timescale` and `$version`.

use std::io::Write;

use time::{format_description::FormatItem, macros::format_description, OffsetDateTime, UtcOffset};

use crate::{runtime, BuilderError};

/// The C `asctime` layout, e.g. `Thu Jan  1 00:00:00 1970`.
const ASCTIME: &[FormatItem<'static>] = format_description!(
    "[weekday repr:short] [month repr:short] [day padding:space] [hour]:[minute]:[second] [year]"
);

/// Format `date` in UTC for the `$date` section.
pub fn format_date(date: OffsetDateTime) -> Result<String, BuilderError> {
    Ok(date.to_offset(UtcOffset::UTC).format(ASCTIME)?)
}

pub(super) fn write_preamble(
    out: &mut dyn Write,
    config: &runtime::Config,
    date: OffsetDateTime,
) -> Result<(), BuilderError> {
    let date = format_date(date)?;
    write!(
        out,
        "$date\n   {date}\n$end\n$timescale\n   {}\n$end\n$version\n   {}\n$end\n",
        config.timescale, config.version
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_format_date() {
        assert_eq!(
            format_date(OffsetDateTime::UNIX_EPOCH).unwrap(),
            "Thu Jan  1 00:00:00 1970"
        );
        assert_eq!(
            format_date(datetime!(2024-03-15 23:30:05 -02:00)).unwrap(),
            "Sat Mar 16 01:30:05 2024"
        );
    }
}
