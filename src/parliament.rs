//! The "parliament" metaphor: a week of events read as a 100-seat chamber.
//!
//! Tags vote for parties by keyword, intensity levels add fixed swings, and
//! the scores are apportioned into seats with the largest-remainder method.
//! Two derived readings summarize the chamber: ruling strength (coalition vs
//! opposition seats) and the dopamine index (indulgence vs discipline).

use chrono::{DateTime, TimeZone};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::aggregation::{first_window_day, histogram_by_level, local_midnight_ms, validate};
use crate::apportion::{SeatAllocation, apportion, apportion_with_floor};
use crate::error::ReportResult;
use crate::model::{Event, LevelCounts, TagIntensityMatrix};

/// Days of history the chamber is elected from, today included.
pub const TERM_DAYS: u32 = 7;

/// Base score every party starts from, so no party is ever empty.
const BASE_SCORE: f64 = 1.0;

/// Seat floor used by tag-mix summaries.
pub const MIX_FLOOR: u32 = 5;

/// Tags shown in a tag-mix summary.
pub const MIX_TAGS: usize = 5;

/// The five parties, in chamber display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    Discipline,
    Stability,
    CrisisManagement,
    Anxiety,
    Indulgence,
}

impl Party {
    /// All parties in display order.
    pub const ALL: [Party; 5] = [
        Party::Discipline,
        Party::Stability,
        Party::CrisisManagement,
        Party::Anxiety,
        Party::Indulgence,
    ];

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Party::Discipline => "Discipline Party",
            Party::Stability => "Stability Bloc",
            Party::CrisisManagement => "Crisis Management",
            Party::Anxiety => "Anxiety Caucus",
            Party::Indulgence => "Indulgence Party",
        }
    }

    /// Keywords that make a tag vote for this party.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Party::Indulgence => &[
                "纵欲", "娱乐", "视频", "刷", "游戏", "熬夜", "外卖", "酒", "性", "社交", "binge",
                "game", "scroll", "video", "party", "takeout", "drink", "late night",
            ],
            Party::Discipline => &[
                "自律", "健身", "跑步", "学习", "早睡", "复盘", "阅读", "写作", "冥想", "规划", "科研",
                "代码", "任务", "ddl", "deadline", "gym", "run", "study", "read", "write", "meditat",
                "plan", "research", "code",
            ],
            Party::Anxiety => &[
                "焦虑", "组会", "父母", "年龄", "proposal", "催命", "崩", "恐惧", "危机", "anxi",
                "panic", "fear", "parents", "worry",
            ],
            Party::Stability => &[
                "平稳", "正常", "放松", "开心", "满足", "平和", "宁静", "calm", "relax", "happy",
                "content", "peace",
            ],
            Party::CrisisManagement => &[
                "应对", "会议", "准备", "修复", "处理", "加班", "解决", "补救", "排查", "meeting",
                "prepare", "fix", "overtime", "debug", "resolve",
            ],
        }
    }

    fn is_ruling(&self) -> bool {
        matches!(
            self,
            Party::Discipline | Party::Stability | Party::CrisisManagement
        )
    }
}

impl std::fmt::Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw party scores before apportionment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartyScores {
    scores: [f64; 5],
}

impl PartyScores {
    fn slot(party: Party) -> usize {
        Party::ALL.iter().position(|p| *p == party).unwrap_or(0)
    }

    fn add(&mut self, party: Party, amount: f64) {
        self.scores[Self::slot(party)] += amount;
    }

    /// Score of one party.
    pub fn get(&self, party: Party) -> f64 {
        self.scores[Self::slot(party)]
    }

    /// `(party, score)` pairs in display order.
    pub fn weights(&self) -> Vec<(Party, f64)> {
        Party::ALL.iter().map(|&p| (p, self.get(p))).collect()
    }
}

/// Score the parties from a set of events.
///
/// Every tag adds 1 to each party that has a keyword contained in it. Levels
/// 1–3 add 2 to Anxiety, level 4 adds 1.5 to Crisis Management, level 5 adds 1
/// to Indulgence and level 6 adds 1.5 to Stability.
pub fn score_parties<'a, I>(events: I) -> ReportResult<PartyScores>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut scores = PartyScores { scores: [0.0; 5] };

    for event in events {
        let level = event.level()?;
        for tag in event.unique_tags() {
            let tag = tag.to_lowercase();
            for party in Party::ALL {
                if party.keywords().iter().any(|kw| tag.contains(kw)) {
                    scores.add(party, 1.0);
                }
            }
        }

        match level.get() {
            1..=3 => scores.add(Party::Anxiety, 2.0),
            4 => scores.add(Party::CrisisManagement, 1.5),
            5 => scores.add(Party::Indulgence, 1.0),
            _ => scores.add(Party::Stability, 1.5),
        }
    }

    for party in Party::ALL {
        scores.add(party, BASE_SCORE);
    }
    Ok(scores)
}

/// How firmly the ruling coalition holds the chamber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RulingStatus {
    /// Coalition leads by at least 10 seats.
    Stable,
    /// Within 10 seats either way.
    Fragile,
    /// Opposition leads by at least 10 seats.
    OppositionLeads,
}

impl RulingStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RulingStatus::Stable => "Stable government",
            RulingStatus::Fragile => "Fragile government",
            RulingStatus::OppositionLeads => "Opposition ascendant",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RulingStrength {
    pub ruling: u32,
    pub opposition: u32,
    pub diff: i64,
    pub status: RulingStatus,
}

impl RulingStrength {
    fn from_seats(seats: &SeatAllocation<Party>) -> Self {
        let (mut ruling, mut opposition) = (0u32, 0u32);
        for (party, count) in seats.iter() {
            if party.is_ruling() {
                ruling += count;
            } else {
                opposition += count;
            }
        }
        let diff = i64::from(ruling) - i64::from(opposition);
        let status = if diff >= 10 {
            RulingStatus::Stable
        } else if diff <= -10 {
            RulingStatus::OppositionLeads
        } else {
            RulingStatus::Fragile
        };
        Self {
            ruling,
            opposition,
            diff,
            status,
        }
    }
}

/// State of the dopamine economy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DopamineStatus {
    /// Indulgence outweighs discipline by 1.4× or more.
    Overheated,
    Balanced,
    /// Indulgence is at most 0.7× discipline.
    Tightening,
}

impl DopamineStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DopamineStatus::Overheated => "Overheated",
            DopamineStatus::Balanced => "Balanced",
            DopamineStatus::Tightening => "Tightening",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DopamineIndex {
    /// Indulgence / discipline score ratio, two decimals.
    pub ratio: f64,
    pub status: DopamineStatus,
}

impl DopamineIndex {
    fn from_scores(scores: &PartyScores) -> Self {
        let indulgence = scores.get(Party::Indulgence);
        let discipline = scores.get(Party::Discipline);
        let ratio = if discipline == 0.0 {
            indulgence
        } else {
            indulgence / discipline
        };
        let ratio = (ratio * 100.0).round() / 100.0;
        let status = if ratio >= 1.4 {
            DopamineStatus::Overheated
        } else if ratio <= 0.7 {
            DopamineStatus::Tightening
        } else {
            DopamineStatus::Balanced
        };
        Self { ratio, status }
    }
}

/// The full chamber reading for one term.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parliament {
    pub sample_size: u64,
    pub level_counts: LevelCounts,
    pub scores: PartyScores,
    pub seats: SeatAllocation<Party>,
    pub ruling: RulingStrength,
    pub dopamine: DopamineIndex,
}

/// Elect the chamber from events between local midnight `TERM_DAYS - 1`
/// days ago and `now` inclusive.
#[instrument(skip_all)]
pub fn convene<'a, I, Tz>(events: I, now: &DateTime<Tz>) -> ReportResult<Parliament>
where
    I: IntoIterator<Item = &'a Event>,
    Tz: TimeZone,
{
    let all: Vec<&Event> = events.into_iter().collect();
    validate(all.iter().copied())?;

    let tz = now.timezone();
    let first_day = first_window_day(now.date_naive(), TERM_DAYS)?;
    let start = local_midnight_ms(&tz, first_day);
    let end = now.timestamp_millis();
    let term: Vec<&Event> = all
        .into_iter()
        .filter(|event| (start..=end).contains(&event.timestamp))
        .collect();

    let level_counts = histogram_by_level(term.iter().copied())?;
    let scores = score_parties(term.iter().copied())?;
    let seats = apportion(&scores.weights())?;
    let ruling = RulingStrength::from_seats(&seats);
    let dopamine = DopamineIndex::from_scores(&scores);

    debug!(
        sample = term.len(),
        ruling = ruling.ruling,
        opposition = ruling.opposition,
        "Parliament convened"
    );

    Ok(Parliament {
        sample_size: term.len() as u64,
        level_counts,
        scores,
        seats,
        ruling,
        dopamine,
    })
}

/// Apportion the top tags of a matrix with a floor of [`MIX_FLOOR`] seats.
pub fn tag_mix(matrix: &TagIntensityMatrix) -> ReportResult<SeatAllocation<String>> {
    let weights: Vec<(String, f64)> = matrix
        .rows()
        .iter()
        .take(MIX_TAGS)
        .map(|row| (row.tag.clone(), row.total() as f64))
        .collect();
    apportion_with_floor(&weights, MIX_FLOOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::tag_intensity_matrix;
    use crate::model::Category;
    use chrono::Utc;

    fn event(level: i32, timestamp: i64, tags: &[&str]) -> Event {
        Event {
            id: format!("e{timestamp}"),
            intensity_level: level,
            content: String::new(),
            is_echo: false,
            timestamp,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            category: Category::Primary,
        }
    }

    #[test]
    fn test_empty_week_is_base_scores() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let chamber = convene(&Vec::<Event>::new(), &now).unwrap();
        assert_eq!(chamber.sample_size, 0);
        assert_eq!(chamber.seats.total(), 100);
        assert!(chamber.seats.iter().all(|(_, s)| s == 20));
        assert_eq!(chamber.ruling.ruling, 60);
        assert_eq!(chamber.ruling.status, RulingStatus::Stable);
        assert_eq!(chamber.dopamine.ratio, 1.0);
        assert_eq!(chamber.dopamine.status, DopamineStatus::Balanced);
    }

    #[test]
    fn test_keywords_and_levels_score() {
        let events = vec![
            event(2, 0, &["Deadline panic"]),
            event(5, 1, &["late night gaming"]),
        ];
        let scores = score_parties(&events).unwrap();
        // deadline -> discipline, panic -> anxiety, level 2 -> anxiety +2.
        assert_eq!(scores.get(Party::Discipline), 2.0);
        assert_eq!(scores.get(Party::Anxiety), 4.0);
        // "late night" -> indulgence, level 5 -> indulgence +1.
        assert_eq!(scores.get(Party::Indulgence), 3.0);
        assert_eq!(scores.get(Party::Stability), 1.0);
    }

    #[test]
    fn test_anxious_week_hands_opposition_the_chamber() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let ts = now.timestamp_millis() - 3_600_000;
        let events: Vec<Event> = (0..10).map(|i| event(1, ts - i, &["焦虑"])).collect();
        let chamber = convene(&events, &now).unwrap();
        assert_eq!(chamber.sample_size, 10);
        assert_eq!(chamber.ruling.status, RulingStatus::OppositionLeads);
        assert_eq!(chamber.seats.total(), 100);
    }

    #[test]
    fn test_term_excludes_old_and_future_events() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let day = 86_400_000;
        let events = vec![
            event(3, now.timestamp_millis() - 10 * day, &[]),
            event(3, now.timestamp_millis() + 1000, &[]),
            event(3, now.timestamp_millis(), &[]),
        ];
        assert_eq!(convene(&events, &now).unwrap().sample_size, 1);
    }

    #[test]
    fn test_term_before_earliest_date_is_an_error() {
        let now = chrono::NaiveDate::MIN.and_time(chrono::NaiveTime::MIN).and_utc();
        assert_eq!(
            convene(&Vec::<Event>::new(), &now).unwrap_err(),
            crate::error::ReportError::WindowOutOfRange { days: TERM_DAYS }
        );
    }

    #[test]
    fn test_dopamine_thresholds() {
        let mut scores = PartyScores { scores: [0.0; 5] };
        scores.add(Party::Indulgence, 3.0);
        scores.add(Party::Discipline, 2.0);
        assert_eq!(DopamineIndex::from_scores(&scores).status, DopamineStatus::Overheated);

        scores.add(Party::Discipline, 3.0);
        let index = DopamineIndex::from_scores(&scores);
        assert_eq!(index.ratio, 0.6);
        assert_eq!(index.status, DopamineStatus::Tightening);
    }

    #[test]
    fn test_tag_mix_floors_small_tags() {
        let mut events = Vec::new();
        for i in 0..40 {
            events.push(event(3, i, &["work"]));
        }
        events.push(event(3, 100, &["sleep"]));
        let matrix = tag_intensity_matrix(&events).unwrap();
        let mix = tag_mix(&matrix).unwrap();
        assert_eq!(mix.total(), 100);
        assert_eq!(mix.get("sleep"), Some(7));
        assert_eq!(mix.get("work"), Some(93));
    }
}
