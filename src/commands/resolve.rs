//! Turning what the user typed into a record.

use anyhow::{Result, bail};

use crate::models::{Speaker, UnavailabilityPeriod, Visit};
use crate::query::text::{contains_ignore_case, normalize_name};

/// Find a speaker by exact id, exact name, or a name fragment matching only one speaker.
pub fn speaker<'a>(speakers: &'a [Speaker], query: &str) -> Result<&'a Speaker> {
    if let Some(s) = speakers.iter().find(|s| s.id == query) {
        return Ok(s);
    }

    let wanted = normalize_name(query);
    let exact: Vec<&Speaker> = speakers.iter().filter(|s| normalize_name(&s.nom) == wanted).collect();
    if exact.len() == 1 {
        return Ok(exact[0]);
    }

    let matches: Vec<&Speaker> = speakers.iter().filter(|s| contains_ignore_case(&s.nom, query.trim())).collect();
    match matches.as_slice() {
        [] => bail!("No speaker found matching \"{}\"", query),
        [only] => Ok(only),
        many => bail!(
            "\"{}\" matches {} speakers: {}. Use the speaker ID instead.",
            query,
            many.len(),
            many.iter().map(|s| format!("{} ({})", s.nom, s.id)).collect::<Vec<_>>().join(", ")
        ),
    }
}

/// Find a visit by full id or an unambiguous id prefix.
pub fn visit<'a>(visits: &'a [Visit], query: &str, kind: &str) -> Result<&'a Visit> {
    if let Some(v) = visits.iter().find(|v| v.visit_id == query) {
        return Ok(v);
    }
    let matches: Vec<&Visit> = visits.iter().filter(|v| v.visit_id.starts_with(query)).collect();
    match matches.as_slice() {
        _ if query.is_empty() => bail!("No {} found matching \"\"", kind),
        [] => bail!("No {} found matching \"{}\"", kind, query),
        [only] => Ok(only),
        many => bail!("\"{}\" matches {} {}s; give more of the ID", query, many.len(), kind),
    }
}

pub fn period<'a>(periods: &'a [UnavailabilityPeriod], query: &str) -> Result<&'a UnavailabilityPeriod> {
    let matches: Vec<&UnavailabilityPeriod> = periods.iter().filter(|p| p.id.starts_with(query)).collect();
    match matches.as_slice() {
        [only] if !query.is_empty() => Ok(only),
        [_, _, ..] => bail!("\"{}\" matches {} periods; give more of the ID", query, matches.len()),
        _ => bail!("No unavailability period found matching \"{}\"", query),
    }
}
