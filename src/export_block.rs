use crate::error::IngestError;

pub const HOME_MARKER: &str = "HOME:  ";
pub const VISITORS_MARKER: &str = "VISITORS:  ";
pub const TEAM_EVENTS_MARKER: &str = "Team Events";

const MATCH_NAME_LINE: usize = 1;
const DATE_LINE: usize = 2;

/// The tracked team's slice of one HoopStats export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchBlock {
    /// `lines[start..end]` of the export: marker line, header, player rows.
    pub lines: Vec<String>,
    pub start: usize,
    pub end: usize,
    pub match_name: String,
    pub date: String,
}

impl MatchBlock {
    pub fn header_line(&self) -> Option<&str> {
        self.lines.get(1).map(String::as_str)
    }

    pub fn data_lines(&self) -> &[String] {
        self.lines.get(2..).unwrap_or(&[])
    }
}

pub fn split_export(raw: &[u8]) -> Result<Vec<String>, IngestError> {
    let text = std::str::from_utf8(raw).map_err(|err| IngestError::InvalidUtf8(err.to_string()))?;
    Ok(text.lines().map(str::to_string).collect())
}

/// Locates the block between `HOME:  <team>` / `VISITORS:  <team>` and the
/// first `Team Events` line at or after it.
///
/// Returns `Ok(None)` when the team never appears. Match name and date come
/// from lines 1 and 2 of the whole export, wherever the block starts.
pub fn extract_team_block(
    lines: &[String],
    team: &str,
) -> Result<Option<MatchBlock>, IngestError> {
    let home = format!("{HOME_MARKER}{team}");
    let visitors = format!("{VISITORS_MARKER}{team}");

    let Some(start) = lines
        .iter()
        .position(|line| line.starts_with(&home) || line.starts_with(&visitors))
    else {
        return Ok(None);
    };

    let end = lines[start..]
        .iter()
        .position(|line| line.starts_with(TEAM_EVENTS_MARKER))
        .map(|offset| start + offset)
        .ok_or_else(|| IngestError::MissingEndMarker {
            team: team.to_string(),
            start,
            marker: TEAM_EVENTS_MARKER,
        })?;

    let (Some(match_name), Some(date_line)) = (lines.get(MATCH_NAME_LINE), lines.get(DATE_LINE))
    else {
        return Err(IngestError::MissingPreamble { lines: lines.len() });
    };
    let date = date_line.split(',').next().unwrap_or_default();

    Ok(Some(MatchBlock {
        lines: lines[start..end].to_vec(),
        start,
        end,
        match_name: match_name.clone(),
        date: date.to_string(),
    }))
}
