use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Speaker, Visit};
use crate::query::dates::month_days;

/// A past talk shown on the calendar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalTalk<'a> {
    pub speaker_id: &'a str,
    pub nom: &'a str,
    pub congregation: &'a str,
    pub talk_no: Option<&'a str>,
    pub theme: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDay<'a> {
    pub date: NaiveDate,
    pub visit: Option<&'a Visit>,
    pub history: Vec<HistoricalTalk<'a>>,
}

impl CalendarDay<'_> {
    pub fn is_empty(&self) -> bool {
        self.visit.is_none() && self.history.is_empty()
    }
}

/// One entry per day of the month containing `month`.
///
/// A day carries at most one scheduled visit (the first non-cancelled one,
/// falling back to a cancelled one) and every speaker whose talk history
/// lists that date, each speaker once.
pub fn month_view<'a>(visits: &'a [Visit], speakers: &'a [Speaker], month: NaiveDate) -> Vec<CalendarDay<'a>> {
    month_days(month)
        .into_iter()
        .map(|date| {
            let on_day = || visits.iter().filter(move |v| v.visit_date == date);
            let visit = on_day().find(|v| !v.is_cancelled()).or_else(|| on_day().next());

            let history = speakers
                .iter()
                .filter_map(|s| {
                    s.talk_history.iter().find(|h| h.date == date).map(|h| HistoricalTalk {
                        speaker_id: &s.id,
                        nom: &s.nom,
                        congregation: &s.congregation,
                        talk_no: h.talk_no.as_deref(),
                        theme: h.theme.as_deref(),
                    })
                })
                .collect();

            CalendarDay { date, visit, history }
        })
        .collect()
}
