//! Integration tests for the TradingCalendar aggregate.

use chrono::NaiveDate;
use common::AggregateId;
use domain::{Aggregate, CalendarError, DomainError, NonTradingDay, Repository, TradingCalendar};
use event_store::{EventStore, InMemoryEventStore, Version};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn holidays_2024() -> Vec<NonTradingDay> {
    vec![
        NonTradingDay::new(date(2024, 1, 1), "New Year's Day"),
        NonTradingDay::new(date(2024, 1, 26), "Australia Day"),
        NonTradingDay::new(date(2024, 3, 29), "Good Friday"),
        NonTradingDay::new(date(2024, 4, 1), "Easter Monday"),
        NonTradingDay::new(date(2024, 12, 25), "Christmas Day"),
        NonTradingDay::new(date(2024, 12, 26), "Boxing Day"),
    ]
}

async fn saved_calendar(repo: &Repository<InMemoryEventStore>) -> AggregateId {
    let id = AggregateId::new();
    let mut calendar = <TradingCalendar as Aggregate>::new(id);
    calendar.set_non_trading_days(2024, holidays_2024()).unwrap();
    repo.save(&mut calendar).await.unwrap();
    id
}

#[tokio::test]
async fn non_trading_days_survive_reload() {
    let repo = Repository::new(InMemoryEventStore::new());
    let id = saved_calendar(&repo).await;

    let calendar: TradingCalendar = repo.load(id).await.unwrap();
    assert_eq!(calendar.version(), Version::first());
    assert_eq!(calendar.non_trading_days(2024), holidays_2024().as_slice());
    assert!(calendar.is_non_trading_day(date(2024, 3, 29)));
    assert!(!calendar.is_trading_day(date(2024, 3, 29)));

    // Thursday before Easter -> Tuesday after
    assert_eq!(
        calendar.next_trading_day(date(2024, 3, 28)),
        Some(date(2024, 4, 2))
    );
}

#[tokio::test]
async fn replacing_a_year_discards_previous_days() {
    let repo = Repository::new(InMemoryEventStore::new());
    let id = saved_calendar(&repo).await;

    let calendar = repo
        .execute(id, |c: &mut TradingCalendar| {
            c.set_non_trading_days(
                2024,
                vec![NonTradingDay::new(date(2024, 6, 10), "King's Birthday")],
            )
        })
        .await
        .unwrap();
    assert_eq!(calendar.version(), Version::new(2));

    let reloaded: TradingCalendar = repo.load(id).await.unwrap();
    assert_eq!(reloaded.non_trading_days(2024).len(), 1);
    assert!(reloaded.is_non_trading_day(date(2024, 6, 10)));
    assert!(!reloaded.is_non_trading_day(date(2024, 12, 25)));
}

#[tokio::test]
async fn other_years_are_untouched_by_a_replacement() {
    let repo = Repository::new(InMemoryEventStore::new());
    let id = saved_calendar(&repo).await;

    repo.execute(id, |c: &mut TradingCalendar| {
        c.set_non_trading_days(
            2025,
            vec![NonTradingDay::new(date(2025, 1, 1), "New Year's Day")],
        )
    })
    .await
    .unwrap();

    let reloaded: TradingCalendar = repo.load(id).await.unwrap();
    assert_eq!(reloaded.years().collect::<Vec<_>>(), vec![2024, 2025]);
    assert_eq!(reloaded.non_trading_days(2024).len(), 6);
    assert_eq!(reloaded.non_trading_days(2025).len(), 1);
}

#[tokio::test]
async fn duplicate_dates_leave_the_stream_unchanged() {
    let repo = Repository::new(InMemoryEventStore::new());
    let id = saved_calendar(&repo).await;

    let mut calendar: TradingCalendar = repo.load(id).await.unwrap();
    let result = calendar.set_non_trading_days(
        2024,
        vec![
            NonTradingDay::new(date(2024, 4, 25), "Anzac Day"),
            NonTradingDay::new(date(2024, 4, 25), "Anzac Day"),
        ],
    );

    assert!(matches!(result, Err(CalendarError::DuplicateDate { .. })));
    assert!(calendar.uncommitted_events().is_empty());
    assert_eq!(calendar.version(), Version::first());

    // Nothing pending, so saving is a no-op.
    assert_eq!(repo.save(&mut calendar).await.unwrap(), Version::first());
    assert_eq!(
        repo.store().head_version(id).await.unwrap(),
        Some(Version::first())
    );
}

#[tokio::test]
async fn stale_calendar_update_conflicts() {
    let repo = Repository::new(InMemoryEventStore::new());
    let id = saved_calendar(&repo).await;

    let mut first: TradingCalendar = repo.load(id).await.unwrap();
    let mut second: TradingCalendar = repo.load(id).await.unwrap();
    first.set_non_trading_days(2025, Vec::new()).unwrap();
    second.set_non_trading_days(2025, Vec::new()).unwrap();

    repo.save(&mut first).await.unwrap();
    let err = repo.save(&mut second).await.unwrap_err();

    assert!(err.is_conflict());
    assert!(!matches!(err, DomainError::Calendar(_)));
    assert_eq!(second.uncommitted_events().len(), 1);
}

#[tokio::test]
async fn load_missing_calendar_is_not_found() {
    let repo = Repository::new(InMemoryEventStore::new());
    let result = repo.load::<TradingCalendar>(AggregateId::new()).await;
    assert!(matches!(
        result,
        Err(DomainError::NotFound {
            aggregate_type: "TradingCalendar",
            ..
        })
    ));
}
