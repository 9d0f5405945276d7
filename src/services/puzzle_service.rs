//! Pre-made puzzle catalogue: listing with filters, detail lookup and admin upload.

use serde_json::Value;
use time::{Date, Weekday};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::models::PuzzleListItemEntity,
    dto::{
        crossword::parse_upload,
        puzzle::{
            PuzzleDetail, PuzzleListItem, PuzzleListQuery, PuzzlePage, RejectedDocument,
            UploadPuzzlesResponse,
        },
    },
    error::ServiceError,
    state::{
        SharedState,
        puzzle::{PuzzleDefinition, parse_puzzle_date, publication_day, publication_year},
    },
};

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Monday,
    Weekday::Tuesday,
    Weekday::Wednesday,
    Weekday::Thursday,
    Weekday::Friday,
    Weekday::Saturday,
    Weekday::Sunday,
];

/// Load any puzzle (pre-made or generated) by id.
pub async fn load_definition(
    state: &SharedState,
    puzzle_id: Uuid,
) -> Result<PuzzleDefinition, ServiceError> {
    let store = state.require_store().await?;
    let entity = store
        .find_puzzle(puzzle_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("puzzle `{puzzle_id}` not found")))?;
    Ok(entity.into())
}

/// Puzzle definition shaped for the rendering widget.
pub async fn get_puzzle(state: &SharedState, puzzle_id: Uuid) -> Result<PuzzleDetail, ServiceError> {
    let definition = load_definition(state, puzzle_id).await?;
    Ok(PuzzleDetail::from(&definition))
}

/// List one page of the pre-made catalogue, sorted by title.
pub async fn list_puzzles(
    state: &SharedState,
    query: &PuzzleListQuery,
) -> Result<PuzzlePage, ServiceError> {
    let filter = CatalogueFilter::from_query(query)?;
    let store = state.require_store().await?;
    let items = store.list_puzzles().await?;
    Ok(filter_and_paginate(
        items,
        &filter,
        query.page.unwrap_or(1),
        state.config().page_size(),
    ))
}

/// Validate and store a batch of uploaded puzzles.
///
/// Invalid documents are reported with their index and never abort the batch. A storage
/// failure does.
pub async fn upload_puzzles(
    state: &SharedState,
    documents: Vec<Value>,
) -> Result<UploadPuzzlesResponse, ServiceError> {
    let store = state.require_store().await?;
    let mut response = UploadPuzzlesResponse::default();

    for (index, document) in documents.into_iter().enumerate() {
        match parse_upload(document) {
            Ok(definition) => {
                let id = definition.id;
                store.save_puzzle(definition.into()).await?;
                response.stored.push(id);
            }
            Err(reason) => {
                warn!(index, reason = %reason, "rejected uploaded puzzle");
                response.rejected.push(RejectedDocument { index, reason });
            }
        }
    }

    info!(
        stored = response.stored.len(),
        rejected = response.rejected.len(),
        "processed puzzle upload"
    );
    Ok(response)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Period {
    Any,
    Year(i32),
    Decade(i32),
    Range { from: Option<Date>, to: Option<Date> },
}

/// Parsed catalogue filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogueFilter {
    title_prefix: Option<String>,
    period: Period,
    weekday: Option<Weekday>,
}

impl CatalogueFilter {
    /// Validate the query; conflicting period filters are rejected.
    pub fn from_query(query: &PuzzleListQuery) -> Result<Self, ServiceError> {
        let has_range = query.date_from.is_some() || query.date_to.is_some();
        let selected = [query.year.is_some(), query.decade.is_some(), has_range]
            .into_iter()
            .filter(|set| *set)
            .count();
        if selected > 1 {
            return Err(ServiceError::InvalidInput(
                "`year`, `decade` and the date range cannot be combined".into(),
            ));
        }

        let period = if let Some(year) = query.year {
            Period::Year(year)
        } else if let Some(decade) = query.decade {
            if decade.rem_euclid(10) != 0 {
                return Err(ServiceError::InvalidInput(format!(
                    "decade `{decade}` must be a multiple of 10"
                )));
            }
            Period::Decade(decade)
        } else if has_range {
            let from = query.date_from.as_deref().map(parse_bound).transpose()?;
            let to = query.date_to.as_deref().map(parse_bound).transpose()?;
            if let (Some(from), Some(to)) = (from, to) {
                if from > to {
                    return Err(ServiceError::InvalidInput(
                        "`date_from` must not be after `date_to`".into(),
                    ));
                }
            }
            Period::Range { from, to }
        } else {
            Period::Any
        };

        let weekday = query.weekday.as_deref().map(parse_weekday).transpose()?;
        let title_prefix = query
            .title_prefix
            .as_deref()
            .map(str::trim)
            .filter(|prefix| !prefix.is_empty())
            .map(str::to_lowercase);

        Ok(Self {
            title_prefix,
            period,
            weekday,
        })
    }

    fn matches(&self, item: &PuzzleListItemEntity) -> bool {
        if let Some(prefix) = &self.title_prefix {
            let title = item.title.as_deref().unwrap_or_default().to_lowercase();
            if !title.starts_with(prefix.as_str()) {
                return false;
            }
        }

        let day = publication_day(item.date.as_deref(), item.created_at);
        let period_matches = match self.period {
            Period::Any => true,
            Period::Year(year) => {
                publication_year(item.year, item.date.as_deref(), item.created_at) == year
            }
            Period::Decade(decade) => {
                let year = publication_year(item.year, item.date.as_deref(), item.created_at);
                year.div_euclid(10) * 10 == decade
            }
            Period::Range { from, to } => {
                from.is_none_or(|from| day >= from) && to.is_none_or(|to| day <= to)
            }
        };

        period_matches && self.weekday.is_none_or(|weekday| day.weekday() == weekday)
    }
}

fn parse_bound(raw: &str) -> Result<Date, ServiceError> {
    parse_puzzle_date(raw)
        .ok_or_else(|| ServiceError::InvalidInput(format!("invalid date `{raw}`, expected YYYY-MM-DD")))
}

fn parse_weekday(raw: &str) -> Result<Weekday, ServiceError> {
    let name = raw.trim();
    WEEKDAYS
        .into_iter()
        .find(|weekday| weekday.to_string().eq_ignore_ascii_case(name))
        .ok_or_else(|| ServiceError::InvalidInput(format!("unknown weekday `{raw}`")))
}

/// Apply `filter`, sort by title (untitled last) and cut page `page` (1-based).
pub fn filter_and_paginate(
    items: Vec<PuzzleListItemEntity>,
    filter: &CatalogueFilter,
    page: usize,
    page_size: usize,
) -> PuzzlePage {
    let page = page.max(1);
    let page_size = page_size.max(1);

    let mut matching: Vec<_> = items.into_iter().filter(|item| filter.matches(item)).collect();
    matching.sort_by(|a, b| {
        let key = |item: &PuzzleListItemEntity| {
            (
                item.title.is_none(),
                item.title.as_deref().map(str::to_lowercase),
                item.id,
            )
        };
        key(a).cmp(&key(b))
    });

    let total = matching.len();
    let start = (page - 1).saturating_mul(page_size);
    let items = matching
        .into_iter()
        .skip(start)
        .take(page_size)
        .map(|item| PuzzleListItem {
            year: publication_year(item.year, item.date.as_deref(), item.created_at),
            id: item.id,
            title: item.title,
            date: item.date,
        })
        .collect();

    PuzzlePage {
        items,
        page,
        page_size,
        total,
        has_next: start.saturating_add(page_size) < total,
        has_prev: page > 1,
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;

    fn item(title: Option<&str>, date: Option<&str>, year: Option<i32>) -> PuzzleListItemEntity {
        PuzzleListItemEntity {
            id: Uuid::new_v4(),
            title: title.map(str::to_owned),
            date: date.map(str::to_owned),
            year,
            owner_id: None,
            created_at: SystemTime::UNIX_EPOCH + Duration::from_secs(86_400 * 365 * 30),
        }
    }

    fn filter(query: PuzzleListQuery) -> CatalogueFilter {
        CatalogueFilter::from_query(&query).unwrap()
    }

    fn titles(page: &PuzzlePage) -> Vec<Option<&str>> {
        page.items.iter().map(|item| item.title.as_deref()).collect()
    }

    #[test]
    fn title_prefix_is_case_insensitive_and_sorted() {
        let items = vec![
            item(Some("Sunday special"), Some("1994-01-02"), None),
            item(Some("saturday stumper"), Some("1994-01-01"), None),
            item(Some("Monday mini"), Some("1994-01-03"), None),
        ];
        let page = filter_and_paginate(
            items,
            &filter(PuzzleListQuery {
                title_prefix: Some("S".into()),
                ..Default::default()
            }),
            1,
            10,
        );
        assert_eq!(
            titles(&page),
            vec![Some("saturday stumper"), Some("Sunday special")]
        );
    }

    #[test]
    fn year_prefers_the_explicit_field() {
        let items = vec![
            item(Some("a"), Some("1994-01-02"), Some(1995)),
            item(Some("b"), Some("1995-06-01"), None),
            item(Some("c"), Some("1994-06-01"), None),
        ];
        let page = filter_and_paginate(
            items,
            &filter(PuzzleListQuery {
                year: Some(1995),
                ..Default::default()
            }),
            1,
            10,
        );
        assert_eq!(titles(&page), vec![Some("a"), Some("b")]);
        assert!(page.items.iter().all(|item| item.year == 1995));
    }

    #[test]
    fn decade_and_weekday_filters_combine() {
        let items = vec![
            // Monday
            item(Some("a"), Some("1990-01-01"), None),
            // Tuesday
            item(Some("b"), Some("1990-01-02"), None),
            // Monday, wrong decade
            item(Some("c"), Some("2001-01-01"), None),
        ];
        let page = filter_and_paginate(
            items,
            &filter(PuzzleListQuery {
                decade: Some(1990),
                weekday: Some("monday".into()),
                ..Default::default()
            }),
            1,
            10,
        );
        assert_eq!(titles(&page), vec![Some("a")]);
    }

    #[test]
    fn date_range_is_inclusive() {
        let items = vec![
            item(Some("a"), Some("1990-01-01"), None),
            item(Some("b"), Some("1990-01-05"), None),
            item(Some("c"), Some("1990-01-06T10:00:00Z"), None),
        ];
        let page = filter_and_paginate(
            items,
            &filter(PuzzleListQuery {
                date_from: Some("1990-01-01".into()),
                date_to: Some("1990-01-05".into()),
                ..Default::default()
            }),
            1,
            10,
        );
        assert_eq!(titles(&page), vec![Some("a"), Some("b")]);
    }

    #[test]
    fn conflicting_or_malformed_filters_are_rejected() {
        let conflicting = PuzzleListQuery {
            year: Some(1990),
            decade: Some(1990),
            ..Default::default()
        };
        assert!(matches!(
            CatalogueFilter::from_query(&conflicting),
            Err(ServiceError::InvalidInput(_))
        ));

        for query in [
            PuzzleListQuery {
                decade: Some(1995),
                ..Default::default()
            },
            PuzzleListQuery {
                weekday: Some("Funday".into()),
                ..Default::default()
            },
            PuzzleListQuery {
                date_from: Some("yesterday".into()),
                ..Default::default()
            },
            PuzzleListQuery {
                date_from: Some("1990-02-01".into()),
                date_to: Some("1990-01-01".into()),
                ..Default::default()
            },
        ] {
            assert!(CatalogueFilter::from_query(&query).is_err(), "{query:?}");
        }
    }

    #[test]
    fn pagination_reports_neighbours() {
        let items: Vec<_> = (0..5)
            .map(|n| item(Some(format!("puzzle {n}").as_str()), None, None))
            .collect();
        let any = filter(PuzzleListQuery::default());

        let first = filter_and_paginate(items.clone(), &any, 1, 2);
        assert_eq!(first.total, 5);
        assert_eq!(titles(&first), vec![Some("puzzle 0"), Some("puzzle 1")]);
        assert!(first.has_next && !first.has_prev);

        let last = filter_and_paginate(items.clone(), &any, 3, 2);
        assert_eq!(titles(&last), vec![Some("puzzle 4")]);
        assert!(!last.has_next && last.has_prev);

        let beyond = filter_and_paginate(items, &any, 9, 2);
        assert!(beyond.items.is_empty());
        assert!(!beyond.has_next);
    }

    #[test]
    fn untitled_puzzles_sort_last() {
        let items = vec![item(None, None, None), item(Some("zebra"), None, None)];
        let page = filter_and_paginate(items, &filter(PuzzleListQuery::default()), 1, 10);
        assert_eq!(titles(&page), vec![Some("zebra"), None]);
    }
}
