// src/services/scheduling.rs

use chrono::{DateTime, Datelike, Duration, Months, NaiveTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Janela de conflito em torno de um horário: `[t - before, t + after]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictWindow {
    pub before: Duration,
    pub after: Duration,
}

impl Default for ConflictWindow {
    fn default() -> Self {
        Self::from_minutes(15, 45)
    }
}

impl ConflictWindow {
    pub fn from_minutes(before: i64, after: i64) -> Self {
        Self {
            before: Duration::minutes(before),
            after: Duration::minutes(after),
        }
    }

    pub fn around(&self, at: DateTime<Utc>) -> TimeWindow {
        TimeWindow {
            start: at - self.before,
            end: at + self.after,
        }
    }

    /// Intervalo de busca no banco: cobre qualquer compromisso `e` tal que
    /// `e` caia na janela de `at` OU `at` caia na janela de `e`.
    pub fn search_range(&self, at: DateTime<Utc>) -> TimeWindow {
        let reach = self.before.max(self.after);
        TimeWindow {
            start: at - reach,
            end: at + reach,
        }
    }

    /// Dois compromissos do mesmo técnico colidem quando um cai na janela do outro.
    pub fn collides(&self, proposed: DateTime<Utc>, existing: DateTime<Utc>) -> bool {
        self.around(proposed).contains(existing) || self.around(existing).contains(proposed)
    }
}

/// Intervalo fechado `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }

    pub fn intersects(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start <= self.end && end >= self.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConflictReason {
    Appointment { id: Uuid, date_time: DateTime<Utc> },
    Absence { id: Uuid },
}

/// Motor de conflito, sem I/O. Compromissos cancelados e o próprio compromisso
/// em edição já devem ter sido filtrados por quem chama.
pub fn find_conflict(
    window: &ConflictWindow,
    proposed: DateTime<Utc>,
    appointments: &[(Uuid, DateTime<Utc>)],
    absences: &[(Uuid, DateTime<Utc>, DateTime<Utc>)],
) -> Option<ConflictReason> {
    if let Some((id, date_time)) = appointments
        .iter()
        .find(|(_, existing)| window.collides(proposed, *existing))
    {
        return Some(ConflictReason::Appointment {
            id: *id,
            date_time: *date_time,
        });
    }

    let slot = window.around(proposed);
    absences
        .iter()
        .find(|(_, start, end)| slot.intersects(*start, *end))
        .map(|(id, _, _)| ConflictReason::Absence { id: *id })
}

/// Mês corrente de `at` como intervalo semiaberto `[início, início do próximo)`.
pub fn month_range(at: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = at.date_naive().with_day(1)?;
    let next = first.checked_add_months(Months::new(1))?;
    Some((
        first.and_time(NaiveTime::MIN).and_utc(),
        next.and_time(NaiveTime::MIN).and_utc(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_booking_thirty_minutes_after_conflicts() {
        let existing = vec![(Uuid::new_v4(), at("2024-01-10T10:00:00Z"))];
        let result = find_conflict(&ConflictWindow::default(), at("2024-01-10T10:30:00Z"), &existing, &[]);
        assert!(matches!(result, Some(ConflictReason::Appointment { .. })));
    }

    #[test]
    fn test_booking_one_hour_after_is_free() {
        let existing = vec![(Uuid::new_v4(), at("2024-01-10T10:00:00Z"))];
        let result = find_conflict(&ConflictWindow::default(), at("2024-01-10T11:00:00Z"), &existing, &[]);
        assert!(result.is_none());
    }

    #[test]
    fn test_booking_just_before_existing_conflicts() {
        // 09:50 + 45 min cobre 10:00
        let existing = vec![(Uuid::new_v4(), at("2024-01-10T10:00:00Z"))];
        let result = find_conflict(&ConflictWindow::default(), at("2024-01-10T09:50:00Z"), &existing, &[]);
        assert!(result.is_some());
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let window = ConflictWindow::default();
        let w = window.around(at("2024-01-10T10:00:00Z"));
        assert!(w.contains(at("2024-01-10T09:45:00Z")));
        assert!(w.contains(at("2024-01-10T10:45:00Z")));
        assert!(!w.contains(at("2024-01-10T10:45:01Z")));
    }

    #[test]
    fn test_absence_covering_slot_conflicts() {
        let absence = (Uuid::new_v4(), at("2024-02-01T00:00:00Z"), at("2024-02-05T00:00:00Z"));
        let result = find_conflict(&ConflictWindow::default(), at("2024-02-03T09:00:00Z"), &[], &[absence]);
        assert_eq!(result, Some(ConflictReason::Absence { id: absence.0 }));
    }

    #[test]
    fn test_absence_touching_window_edge_conflicts() {
        // A ausência termina exatamente no início da janela (10:00 - 15 min)
        let absence = (Uuid::new_v4(), at("2024-02-01T08:00:00Z"), at("2024-02-01T09:45:00Z"));
        let result = find_conflict(&ConflictWindow::default(), at("2024-02-01T10:00:00Z"), &[], &[absence]);
        assert!(result.is_some());
    }

    #[test]
    fn test_absence_far_from_slot_is_ignored() {
        let absence = (Uuid::new_v4(), at("2024-02-01T08:00:00Z"), at("2024-02-01T09:00:00Z"));
        let result = find_conflict(&ConflictWindow::default(), at("2024-02-01T11:00:00Z"), &[], &[absence]);
        assert!(result.is_none());
    }

    #[test]
    fn test_custom_window_is_respected() {
        let window = ConflictWindow::from_minutes(0, 120);
        let existing = vec![(Uuid::new_v4(), at("2024-01-10T10:00:00Z"))];
        assert!(find_conflict(&window, at("2024-01-10T11:30:00Z"), &existing, &[]).is_some());
        assert!(find_conflict(&window, at("2024-01-10T12:30:00Z"), &existing, &[]).is_none());
    }

    #[test]
    fn test_search_range_covers_both_directions() {
        let window = ConflictWindow::default();
        let range = window.search_range(at("2024-01-10T10:30:00Z"));
        assert!(range.contains(at("2024-01-10T09:45:00Z")));
        assert!(range.contains(at("2024-01-10T11:15:00Z")));
    }

    #[test]
    fn test_month_range_rolls_over_december() {
        let (start, end) = month_range(at("2024-12-31T23:59:00Z")).unwrap();
        assert_eq!(start, at("2024-12-01T00:00:00Z"));
        assert_eq!(end, at("2025-01-01T00:00:00Z"));
    }

    #[test]
    fn test_month_range_handles_leap_february() {
        let (start, end) = month_range(at("2024-02-29T12:00:00Z")).unwrap();
        assert_eq!(start, at("2024-02-01T00:00:00Z"));
        assert_eq!(end, at("2024-03-01T00:00:00Z"));
    }
}
