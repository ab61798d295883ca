//! In-memory store used when no database is configured.
//!
//! The seeded variant carries a static catalog of twelve publications
//! (years 2020-2024) so the publications and analytics endpoints stay
//! useful without Postgres. Chat persistence is a no-op: writes succeed
//! silently and reads come back empty.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use std::cmp::Reverse;
use std::collections::BTreeMap;

use super::models::{
    AnalyticsSnapshot, AnalyticsTotals, AreaCount, AuthorCount, ChatMessageRecord, KeywordCount,
    MessageRole, Publication, PublicationPage, PublicationQuery, ResearchAreaCount, ResearchMode,
    SessionSummary, SourceId, SourceRecord, YearCount, YearRange,
};
use super::Store;
use crate::errors::AppError;

pub struct MockStore {
    publications: Vec<MockPublication>,
}

#[derive(Debug, Clone)]
struct MockPublication {
    id: i32,
    title: String,
    authors: String,
    publication_year: i32,
    abstract_text: String,
    results: String,
    conclusion: String,
    nasa_publication_id: String,
    research_area: String,
    keywords: Vec<String>,
    created_at: DateTime<Utc>,
}

impl MockPublication {
    /// Case-insensitive substring match over the listing fields
    /// (title, abstract, authors, keywords).
    fn matches_listing(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.abstract_text.to_lowercase().contains(needle)
            || self.authors.to_lowercase().contains(needle)
            || self.keywords.join(" ").to_lowercase().contains(needle)
    }

    /// Match-field priority for the chat search: title ranks above
    /// abstract ranks above everything else. None when nothing matches.
    fn chat_rank(&self, needle: &str) -> Option<u8> {
        if self.title.to_lowercase().contains(needle) {
            Some(1)
        } else if self.abstract_text.to_lowercase().contains(needle) {
            Some(2)
        } else if self.results.to_lowercase().contains(needle)
            || self.conclusion.to_lowercase().contains(needle)
            || self.keywords.join(" ").to_lowercase().contains(needle)
        {
            Some(3)
        } else {
            None
        }
    }

    fn to_source_record(&self) -> SourceRecord {
        SourceRecord {
            id: SourceId::Id(self.id as i64),
            title: self.title.clone(),
            authors: Some(self.authors.clone()),
            publication_year: Some(self.publication_year),
            abstract_text: Some(self.abstract_text.clone()),
            results: Some(self.results.clone()),
            conclusion: Some(self.conclusion.clone()),
            nasa_publication_id: Some(self.nasa_publication_id.clone()),
            research_area: Some(self.research_area.clone()),
            keywords: self.keywords.clone(),
            url: None,
        }
    }

    fn to_publication(&self) -> Publication {
        Publication {
            id: self.id,
            title: self.title.clone(),
            authors: Some(self.authors.clone()),
            publication_year: Some(self.publication_year),
            abstract_text: Some(self.abstract_text.clone()),
            research_area: Some(self.research_area.clone()),
            keywords: self.keywords.clone(),
            nasa_publication_id: Some(self.nasa_publication_id.clone()),
            created_at: self.created_at,
        }
    }
}

impl MockStore {
    /// Store with the static twelve-publication catalog.
    pub fn seeded() -> Self {
        Self {
            publications: seed_publications(),
        }
    }

    /// Store with no publications at all.
    pub fn empty() -> Self {
        Self {
            publications: Vec::new(),
        }
    }

    fn area_counts(&self) -> Vec<AreaCount> {
        let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
        for publication in &self.publications {
            *counts.entry(publication.research_area.as_str()).or_insert(0) += 1;
        }
        let mut areas: Vec<AreaCount> = counts
            .into_iter()
            .map(|(area, count)| AreaCount {
                area: area.to_string(),
                count,
            })
            .collect();
        // BTreeMap gives area ASC; stable sort keeps it as the tiebreaker
        areas.sort_by_key(|a| Reverse(a.count));
        areas
    }
}

#[async_trait]
impl Store for MockStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn search_publications(
        &self,
        query: &str,
        limit: u64,
    ) -> Result<Vec<SourceRecord>, AppError> {
        let needle = query.to_lowercase();
        let mut matched: Vec<(u8, &MockPublication)> = self
            .publications
            .iter()
            .filter_map(|p| p.chat_rank(&needle).map(|rank| (rank, p)))
            .collect();
        matched.sort_by_key(|(rank, p)| (*rank, Reverse(p.publication_year)));

        Ok(matched
            .into_iter()
            .take(limit as usize)
            .map(|(_, p)| p.to_source_record())
            .collect())
    }

    async fn list_publications(
        &self,
        query: &PublicationQuery,
    ) -> Result<PublicationPage, AppError> {
        let needle = query
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let area = query
            .research_area
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut matched: Vec<&MockPublication> = self
            .publications
            .iter()
            .filter(|p| match &needle {
                Some(n) => p.matches_listing(n),
                None => true,
            })
            .filter(|p| match &area {
                Some(a) => p.research_area.to_lowercase() == *a,
                None => true,
            })
            .filter(|p| query.year_from.map_or(true, |y| p.publication_year >= y))
            .filter(|p| query.year_to.map_or(true, |y| p.publication_year <= y))
            .collect();
        matched.sort_by_key(|p| (Reverse(p.publication_year), Reverse(p.created_at)));

        let total = matched.len() as u64;
        let offset = (query.page.saturating_sub(1) * query.limit) as usize;
        let publications = matched
            .into_iter()
            .skip(offset)
            .take(query.limit as usize)
            .map(|p| p.to_publication())
            .collect();

        let year_range = match (
            self.publications.iter().map(|p| p.publication_year).min(),
            self.publications.iter().map(|p| p.publication_year).max(),
        ) {
            (Some(min), Some(max)) => YearRange {
                min_year: min,
                max_year: max,
            },
            _ => YearRange::default(),
        };

        Ok(PublicationPage {
            publications,
            total,
            research_areas: self
                .area_counts()
                .into_iter()
                .map(|a| ResearchAreaCount {
                    research_area: a.area,
                    count: a.count,
                })
                .collect(),
            year_range,
        })
    }

    async fn analytics(&self) -> Result<AnalyticsSnapshot, AppError> {
        let mut by_year_map: BTreeMap<i32, i64> = BTreeMap::new();
        let mut keyword_map: BTreeMap<&str, i64> = BTreeMap::new();
        let mut author_map: BTreeMap<&str, i64> = BTreeMap::new();
        for publication in &self.publications {
            *by_year_map.entry(publication.publication_year).or_insert(0) += 1;
            *author_map.entry(publication.authors.as_str()).or_insert(0) += 1;
            for keyword in &publication.keywords {
                *keyword_map.entry(keyword.as_str()).or_insert(0) += 1;
            }
        }

        let by_area = self.area_counts();
        let mut research_gaps: Vec<AreaCount> = by_area
            .iter()
            .filter(|a| a.count <= 3)
            .cloned()
            .collect();
        research_gaps.sort_by(|a, b| a.count.cmp(&b.count).then(a.area.cmp(&b.area)));

        let mut top_keywords: Vec<KeywordCount> = keyword_map
            .into_iter()
            .map(|(keyword, count)| KeywordCount {
                keyword: keyword.to_string(),
                count,
            })
            .collect();
        top_keywords.sort_by_key(|k| Reverse(k.count));
        top_keywords.truncate(15);

        // Distinct-author total comes from the full map, before the
        // top-authors series is truncated
        let distinct_authors = author_map.len() as i64;
        let mut top_authors: Vec<AuthorCount> = author_map
            .into_iter()
            .map(|(author, count)| AuthorCount {
                author: author.to_string(),
                count,
            })
            .collect();
        top_authors.sort_by_key(|a| Reverse(a.count));
        top_authors.truncate(10);

        let count = self.publications.len() as i64;
        let avg_year = (count > 0).then(|| {
            self.publications
                .iter()
                .map(|p| p.publication_year as f64)
                .sum::<f64>()
                / count as f64
        });
        let current_year = Utc::now().year();
        let recent = self
            .publications
            .iter()
            .filter(|p| p.publication_year >= current_year - 4)
            .count() as i64;

        Ok(AnalyticsSnapshot {
            totals: AnalyticsTotals {
                total_publications: count,
                total_areas: by_area.len() as i64,
                total_authors: distinct_authors,
                avg_year,
                recent_publications: recent,
            },
            by_year: by_year_map
                .into_iter()
                .map(|(year, count)| YearCount { year, count })
                .collect(),
            by_area,
            top_keywords,
            top_authors,
            // No chat log without a database, so activity and topic
            // mention series stay empty.
            chat_activity: Vec::new(),
            popular_topics: Vec::new(),
            research_gaps,
        })
    }

    async fn ensure_session(&self, _session_id: &str, _mode: ResearchMode) -> Result<(), AppError> {
        Ok(())
    }

    async fn log_message(
        &self,
        _session_id: &str,
        _role: MessageRole,
        _content: &str,
        _sources: Option<serde_json::Value>,
    ) -> Result<(), AppError> {
        Ok(())
    }

    async fn session_history(
        &self,
        _session_id: &str,
        _limit: u64,
    ) -> Result<Vec<ChatMessageRecord>, AppError> {
        Ok(Vec::new())
    }

    async fn clear_history(&self, _session_id: &str) -> Result<(), AppError> {
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, AppError> {
        Ok(Vec::new())
    }

    async fn delete_session(&self, _session_id: &str) -> Result<(), AppError> {
        Ok(())
    }
}

fn seed_publications() -> Vec<MockPublication> {
    let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

    let entry = |id: i32,
                 year: i32,
                 title: &str,
                 authors: &str,
                 area: &str,
                 abstract_text: &str,
                 results: &str,
                 conclusion: &str,
                 keywords: &[&str]| MockPublication {
        id,
        title: title.to_string(),
        authors: authors.to_string(),
        publication_year: year,
        abstract_text: abstract_text.to_string(),
        results: results.to_string(),
        conclusion: conclusion.to_string(),
        nasa_publication_id: format!("NASA-BIO-{:04}", id),
        research_area: area.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        created_at: base + Duration::days(id as i64),
    };

    vec![
        entry(
            1,
            2020,
            "Microgravity-Induced Bone Density Loss in Long-Duration Spaceflight",
            "Nguyen, T., Rodriguez, M.",
            "Bone & Muscle Physiology",
            "Longitudinal DXA scans of twelve crew members reveal progressive loss of bone mineral density during six-month increments aboard the International Space Station.",
            "Mean femoral neck density declined 1.2% per month; losses concentrated in weight-bearing sites.",
            "Unloaded skeletal sites demineralize fastest; recovery after return takes longer than the mission itself.",
            &["microgravity", "bone density", "osteoporosis"],
        ),
        entry(
            2,
            2020,
            "Arabidopsis Root Growth Aboard the International Space Station",
            "Okafor, C., Lindgren, S.",
            "Plant Biology",
            "Arabidopsis thaliana seedlings were cultured in the Vegetable Production System to characterize root architecture without a gravity vector.",
            "Roots exhibited pronounced skewing and reduced gravitropic curvature relative to ground controls.",
            "Light gradients partially substitute for gravity in guiding root orientation.",
            &["plant biology", "root growth", "ISS"],
        ),
        entry(
            3,
            2021,
            "Cosmic Radiation Dosimetry and DNA Damage in Murine Models",
            "Petrova, I., Haddad, R.",
            "Radiation Biology",
            "Mice exposed to simulated galactic cosmic ray spectra were assayed for double-strand break frequency and repair kinetics.",
            "Dose-dependent increases in gamma-H2AX foci persisted 72 hours post-exposure.",
            "Heavy-ion components drive disproportionate genomic damage compared to equivalent gamma doses.",
            &["radiation", "DNA damage", "dosimetry"],
        ),
        entry(
            4,
            2021,
            "Resistive Exercise Countermeasures for Muscle Atrophy in Microgravity",
            "Nguyen, T., Rodriguez, M.",
            "Bone & Muscle Physiology",
            "Evaluation of the Advanced Resistive Exercise Device protocol against quadriceps and soleus volume loss in microgravity.",
            "High-load protocols preserved 85% of preflight muscle cross-sectional area.",
            "Daily resistive loading remains the most effective in-flight countermeasure for atrophy.",
            &["microgravity", "muscle atrophy", "exercise"],
        ),
        entry(
            5,
            2022,
            "Photosynthetic Efficiency of Lettuce Cultivars in Spaceflight Conditions",
            "Lindgren, S., Moreau, A.",
            "Plant Biology",
            "Four lettuce cultivars grown under LED lighting in orbit were compared for quantum yield and edible biomass.",
            "Outredgeous romaine outperformed other cultivars by 18% in edible mass.",
            "Cultivar selection matters as much as lighting recipe for space crop production.",
            &["plant biology", "photosynthesis", "crop production"],
        ),
        entry(
            6,
            2022,
            "Biofilm Formation of Pseudomonas aeruginosa in Simulated Microgravity",
            "Kowalski, D., Tan, W.",
            "Microbiology",
            "Rotating wall vessel cultures were used to study biofilm architecture under low-shear modeled microgravity.",
            "Biofilms formed column-and-canopy structures not observed in normal gravity controls.",
            "Spacecraft water systems face elevated biofouling risk from altered biofilm phenotypes.",
            &["microbiology", "biofilm", "microgravity"],
        ),
        entry(
            7,
            2022,
            "Trabecular Microarchitecture Changes After Six Months in Orbit",
            "Haddad, R., Ferreira, L.",
            "Bone & Muscle Physiology",
            "High-resolution peripheral quantitative CT of returning crew quantifies trabecular thinning in the distal tibia.",
            "Trabecular number fell 6% on average; cortical porosity increased in half the cohort.",
            "Microarchitectural degradation exceeds what areal density alone suggests.",
            &["bone density", "microarchitecture", "spaceflight"],
        ),
        entry(
            8,
            2023,
            "Shielding Efficacy Against Galactic Cosmic Rays in Deep-Space Habitats",
            "Petrova, I., Yamada, K.",
            "Radiation Biology",
            "Monte Carlo transport simulations benchmark polyethylene and regolith shielding strategies for Mars-transit habitats.",
            "Thirty centimeters of regolith halves effective dose from the heavy-ion component.",
            "No practical shielding mass eliminates the galactic cosmic ray problem; biology must tolerate a residual dose.",
            &["radiation", "shielding", "deep space"],
        ),
        entry(
            9,
            2023,
            "Cardiovascular Deconditioning During Extended Orbital Missions",
            "Moreau, A., Virtanen, E.",
            "Cardiovascular Health",
            "Echocardiography and cardiac MRI before and after flight document left ventricular mass changes and orthostatic intolerance incidence.",
            "Ventricular mass declined 9%; a third of crew showed post-flight orthostatic intolerance.",
            "Cephalad fluid shift drives cardiac remodeling that current exercise protocols only partly offset.",
            &["cardiovascular", "fluid shift", "deconditioning"],
        ),
        entry(
            10,
            2023,
            "Bisphosphonate Therapy as a Bone Loss Countermeasure in Microgravity",
            "Rodriguez, M., Okafor, C.",
            "Bone & Muscle Physiology",
            "Crew members combining alendronate with resistive exercise were compared against exercise-only controls across ISS increments.",
            "The combined group maintained preflight bone density at all measured sites.",
            "Pharmacological adjuncts close the gap that exercise alone leaves in skeletal protection.",
            &["microgravity", "bone density", "countermeasures"],
        ),
        entry(
            11,
            2024,
            "Tomato Fruit Development Under Lunar-Analog Gravity",
            "Tan, W., Lindgren, S.",
            "Plant Biology",
            "Centrifuge-based partial gravity experiments track flowering, pollination, and fruit set of dwarf tomato at one-sixth g.",
            "Fruit set succeeded at lunar gravity with manual pollination; sugar content matched 1g controls.",
            "Fruiting crops are viable for lunar surface agriculture given pollination support.",
            &["plant biology", "partial gravity", "fruit development"],
        ),
        entry(
            12,
            2024,
            "Gut Microbiome Shifts in Crew Members on Year-Long Missions",
            "Virtanen, E., Kowalski, D.",
            "Microbiology",
            "16S rRNA sequencing of longitudinal stool samples characterizes microbial community drift across a twelve-month mission.",
            "Alpha diversity declined steadily; Firmicutes-to-Bacteroidetes ratio shifted toward preflight baseline after return.",
            "Closed-habitat diet and environment reshape the crew microbiome in largely reversible ways.",
            &["microbiology", "microbiome", "crew health"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_catalog_has_twelve_publications_across_five_years() {
        let store = MockStore::seeded();
        let snapshot = store.analytics().await.unwrap();
        assert_eq!(snapshot.totals.total_publications, 12);
        let years: Vec<i32> = snapshot.by_year.iter().map(|y| y.year).collect();
        assert_eq!(years, vec![2020, 2021, 2022, 2023, 2024]);
        assert_eq!(snapshot.by_year.iter().map(|y| y.count).sum::<i64>(), 12);
        // Mean of the seeded years rounds to 2022
        assert_eq!(snapshot.totals.avg_year.unwrap().round() as i32, 2022);
    }

    #[tokio::test]
    async fn total_authors_counts_all_distinct_author_strings() {
        let store = MockStore::seeded();
        let snapshot = store.analytics().await.unwrap();
        let distinct: std::collections::HashSet<&str> = store
            .publications
            .iter()
            .map(|p| p.authors.as_str())
            .collect();
        // One author pair recurs in the catalog, so distinct < 12 but
        // still exceeds the truncated top-authors series
        assert_eq!(snapshot.totals.total_authors, distinct.len() as i64);
        assert_eq!(snapshot.totals.total_authors, 11);
        assert_eq!(snapshot.top_authors.len(), 10);
    }

    #[tokio::test]
    async fn chat_search_ranks_title_matches_first() {
        let store = MockStore::seeded();
        let results = store.search_publications("bone density", 5).await.unwrap();
        assert!(!results.is_empty());
        // Title matches outrank keyword-only matches regardless of year
        assert!(results[0].title.to_lowercase().contains("bone density"));
        for record in &results {
            let text = format!(
                "{} {} {} {} {}",
                record.title,
                record.abstract_text.as_deref().unwrap_or(""),
                record.results.as_deref().unwrap_or(""),
                record.conclusion.as_deref().unwrap_or(""),
                record.keywords.join(" ")
            );
            assert!(text.to_lowercase().contains("bone density"));
        }
    }

    #[tokio::test]
    async fn listing_filters_by_search_and_sorts_by_year_desc() {
        let store = MockStore::seeded();
        let page = store
            .list_publications(&PublicationQuery {
                search: Some("microgravity".to_string()),
                page: 1,
                limit: 12,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(page.total > 0);
        let years: Vec<i32> = page
            .publications
            .iter()
            .map(|p| p.publication_year.unwrap())
            .collect();
        let mut sorted = years.clone();
        sorted.sort_by_key(|y| Reverse(*y));
        assert_eq!(years, sorted);
        for publication in &page.publications {
            assert!(searchable_text(publication)
                .to_lowercase()
                .contains("microgravity"));
        }
    }

    #[tokio::test]
    async fn inverted_year_range_yields_empty_page_not_error() {
        let store = MockStore::seeded();
        let page = store
            .list_publications(&PublicationQuery {
                year_from: Some(2024),
                year_to: Some(2020),
                page: 1,
                limit: 12,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 0);
        assert!(page.publications.is_empty());
    }

    #[tokio::test]
    async fn empty_store_reports_default_year_range() {
        let store = MockStore::empty();
        let page = store
            .list_publications(&PublicationQuery {
                page: 1,
                limit: 12,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 0);
        assert_eq!(page.year_range.min_year, 1990);
        assert_eq!(page.year_range.max_year, 2024);
    }

    #[tokio::test]
    async fn research_gaps_sorted_by_count_then_area() {
        let store = MockStore::seeded();
        let snapshot = store.analytics().await.unwrap();
        for pair in snapshot.research_gaps.windows(2) {
            assert!(
                pair[0].count < pair[1].count
                    || (pair[0].count == pair[1].count && pair[0].area <= pair[1].area)
            );
        }
        assert!(snapshot.research_gaps.iter().all(|g| g.count <= 3));
    }

    fn searchable_text(publication: &Publication) -> String {
        format!(
            "{} {} {} {}",
            publication.title,
            publication.abstract_text.as_deref().unwrap_or(""),
            publication.authors.as_deref().unwrap_or(""),
            publication.keywords.join(" ")
        )
    }
}
