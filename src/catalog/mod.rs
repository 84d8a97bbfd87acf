//! Fixed catalog of warehouse aggregations backing the dashboard charts.
//!
//! Every chart is one group-by with a single aggregate, an ordering and an
//! optional row cap, so each is described by a [`ChartSpec`] row in
//! [`CATALOG`] and rendered to SQL by [`ChartSpec::sql`]. Identifiers in the
//! rendered SQL only ever come from this module, never from request input.

/// Revenue attributed to a single view.
pub const REVENUE_PER_VIEW: f64 = 0.05;

/// Warehouse tables counted for the headline totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    DimUser,
    DimMovie,
    FactViews,
}

impl Table {
    pub const fn name(self) -> &'static str {
        match self {
            Self::DimUser => "dim_user",
            Self::DimMovie => "dim_movie",
            Self::FactViews => "fact_views",
        }
    }

    /// Row count over the whole table.
    pub fn count_sql(self) -> String {
        format!("SELECT COUNT(*) FROM {}", self.name())
    }
}

/// Dashboard charts, in [`CATALOG`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chart {
    GenreDistribution,
    ViewsOverTime,
    UserDistribution,
    TopMovies,
    UsersByCountry,
    RevenueTimeline,
}

impl Chart {
    pub const ALL: [Chart; 6] = [
        Self::GenreDistribution,
        Self::ViewsOverTime,
        Self::UserDistribution,
        Self::TopMovies,
        Self::UsersByCountry,
        Self::RevenueTimeline,
    ];

    /// Path segment under `/api/charts/`.
    pub const fn slug(self) -> &'static str {
        match self {
            Self::GenreDistribution => "genre-distribution",
            Self::ViewsOverTime => "views-over-time",
            Self::UserDistribution => "user-distribution",
            Self::TopMovies => "top-movies",
            Self::UsersByCountry => "users-by-country",
            Self::RevenueTimeline => "revenue-timeline",
        }
    }

    pub fn spec(self) -> &'static ChartSpec {
        &CATALOG[self as usize]
    }
}

/// Relation an aggregation reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// `fact_views` joined to `dim_movie`.
    ViewsByMovie,
    /// `fact_views` joined to `dim_date`.
    ViewsByDate,
    /// `dim_user` on its own.
    Users,
}

impl Source {
    const fn from_clause(self) -> &'static str {
        match self {
            Self::ViewsByMovie => "fact_views f JOIN dim_movie m ON f.movie_id = m.movie_id",
            Self::ViewsByDate => "fact_views f JOIN dim_date d ON f.date_id = d.date_id",
            Self::Users => "dim_user u",
        }
    }
}

/// How an aggregated value must be parsed before serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Decimal,
}

/// The single aggregate a chart computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// `SUM(f.total_views)`
    TotalViews,
    /// `COUNT(u.user_id)`
    UserCount,
    /// Views multiplied by [`REVENUE_PER_VIEW`].
    Revenue,
}

impl Metric {
    fn expression(self) -> String {
        match self {
            Self::TotalViews => "SUM(f.total_views)".to_string(),
            Self::UserCount => "COUNT(u.user_id)".to_string(),
            Self::Revenue => format!("SUM(f.total_views) * {REVENUE_PER_VIEW}"),
        }
    }

    pub const fn value_kind(self) -> ValueKind {
        match self {
            Self::TotalViews | Self::UserCount => ValueKind::Integer,
            Self::Revenue => ValueKind::Decimal,
        }
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Largest metric first; ties broken by the group keys ascending.
    MetricDesc,
    /// Group keys ascending (chronological for date charts).
    KeyAsc,
}

/// Declarative description of one chart aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSpec {
    pub chart: Chart,
    pub source: Source,
    /// Expression rendered as the row label.
    pub label: &'static str,
    /// Grouping columns; also the tie-break keys.
    pub group_by: &'static [&'static str],
    pub metric: Metric,
    pub order: SortOrder,
    pub limit: Option<i64>,
    /// JSON key for the label in the response.
    pub label_field: &'static str,
    /// JSON key for the metric in the response.
    pub value_field: &'static str,
}

impl ChartSpec {
    /// Render the aggregation. Both columns come back as text: `label` and
    /// `value`, the latter parsed by the response mapper.
    pub fn sql(&self) -> String {
        let group_by = self.group_by.join(", ");
        let keys_asc = self
            .group_by
            .iter()
            .map(|key| format!("{key} ASC"))
            .collect::<Vec<_>>()
            .join(", ");
        let order_by = match self.order {
            SortOrder::MetricDesc => format!("{} DESC, {keys_asc}", self.metric.expression()),
            SortOrder::KeyAsc => keys_asc,
        };

        let mut sql = format!(
            "SELECT ({label})::text AS label, ({metric})::text AS value \
             FROM {from} \
             GROUP BY {group_by} \
             ORDER BY {order_by}",
            label = self.label,
            metric = self.metric.expression(),
            from = self.source.from_clause(),
        );
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        sql
    }
}

/// All chart aggregations, indexed by `Chart as usize`.
pub static CATALOG: [ChartSpec; 6] = [
    ChartSpec {
        chart: Chart::GenreDistribution,
        source: Source::ViewsByMovie,
        label: "m.genre",
        group_by: &["m.genre"],
        metric: Metric::TotalViews,
        order: SortOrder::MetricDesc,
        limit: Some(10),
        label_field: "genre",
        value_field: "views",
    },
    ChartSpec {
        chart: Chart::ViewsOverTime,
        source: Source::ViewsByDate,
        label: "to_char(d.date, 'YYYY-MM-DD')",
        group_by: &["d.date"],
        metric: Metric::TotalViews,
        order: SortOrder::KeyAsc,
        limit: Some(30),
        label_field: "date",
        value_field: "views",
    },
    ChartSpec {
        chart: Chart::UserDistribution,
        source: Source::Users,
        label: "u.age_group",
        group_by: &["u.age_group"],
        metric: Metric::UserCount,
        order: SortOrder::MetricDesc,
        limit: None,
        label_field: "age_group",
        value_field: "count",
    },
    ChartSpec {
        chart: Chart::TopMovies,
        source: Source::ViewsByMovie,
        label: "m.title",
        // movie_id keeps same-title movies apart
        group_by: &["m.title", "m.movie_id"],
        metric: Metric::TotalViews,
        order: SortOrder::MetricDesc,
        limit: Some(10),
        label_field: "title",
        value_field: "views",
    },
    ChartSpec {
        chart: Chart::UsersByCountry,
        source: Source::Users,
        label: "u.country",
        group_by: &["u.country"],
        metric: Metric::UserCount,
        order: SortOrder::MetricDesc,
        limit: Some(15),
        label_field: "country",
        value_field: "user_count",
    },
    ChartSpec {
        chart: Chart::RevenueTimeline,
        source: Source::ViewsByDate,
        label: "to_char(d.date, 'YYYY-MM-DD')",
        group_by: &["d.date"],
        metric: Metric::Revenue,
        order: SortOrder::KeyAsc,
        limit: Some(30),
        label_field: "date",
        value_field: "total_revenue",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_indexed_by_chart() {
        for chart in Chart::ALL {
            assert_eq!(chart.spec().chart, chart);
        }
    }

    #[test]
    fn slugs_are_unique() {
        let mut slugs: Vec<_> = Chart::ALL.iter().map(|c| c.slug()).collect();
        slugs.sort_unstable();
        slugs.dedup();
        assert_eq!(slugs.len(), Chart::ALL.len());
    }

    #[test]
    fn row_caps() {
        assert_eq!(Chart::GenreDistribution.spec().limit, Some(10));
        assert_eq!(Chart::TopMovies.spec().limit, Some(10));
        assert_eq!(Chart::UsersByCountry.spec().limit, Some(15));
        assert_eq!(Chart::ViewsOverTime.spec().limit, Some(30));
        assert_eq!(Chart::RevenueTimeline.spec().limit, Some(30));
        assert_eq!(Chart::UserDistribution.spec().limit, None);
    }

    #[test]
    fn genre_distribution_sql() {
        assert_eq!(
            Chart::GenreDistribution.spec().sql(),
            "SELECT (m.genre)::text AS label, (SUM(f.total_views))::text AS value \
             FROM fact_views f JOIN dim_movie m ON f.movie_id = m.movie_id \
             GROUP BY m.genre \
             ORDER BY SUM(f.total_views) DESC, m.genre ASC \
             LIMIT 10"
        );
    }

    #[test]
    fn timelines_sort_by_date_ascending() {
        for chart in [Chart::ViewsOverTime, Chart::RevenueTimeline] {
            let sql = chart.spec().sql();
            assert!(sql.contains("GROUP BY d.date ORDER BY d.date ASC LIMIT 30"), "{sql}");
            assert!(sql.contains("to_char(d.date, 'YYYY-MM-DD')"), "{sql}");
        }
    }

    #[test]
    fn user_distribution_has_no_limit() {
        let sql = Chart::UserDistribution.spec().sql();
        assert!(sql.ends_with("ORDER BY COUNT(u.user_id) DESC, u.age_group ASC"), "{sql}");
        assert!(!sql.contains("LIMIT"));
    }

    #[test]
    fn top_movies_groups_by_title_and_id() {
        let sql = Chart::TopMovies.spec().sql();
        assert!(sql.contains("GROUP BY m.title, m.movie_id"), "{sql}");
        assert!(
            sql.contains("ORDER BY SUM(f.total_views) DESC, m.title ASC, m.movie_id ASC"),
            "{sql}"
        );
    }

    #[test]
    fn revenue_applies_per_view_rate() {
        let sql = Chart::RevenueTimeline.spec().sql();
        assert!(sql.contains("(SUM(f.total_views) * 0.05)::text AS value"), "{sql}");
        assert_eq!(Metric::Revenue.value_kind(), ValueKind::Decimal);
        assert_eq!(Metric::TotalViews.value_kind(), ValueKind::Integer);
    }

    #[test]
    fn totals_count_whole_tables() {
        assert_eq!(Table::DimUser.count_sql(), "SELECT COUNT(*) FROM dim_user");
        assert_eq!(Table::DimMovie.count_sql(), "SELECT COUNT(*) FROM dim_movie");
        assert_eq!(Table::FactViews.count_sql(), "SELECT COUNT(*) FROM fact_views");
    }
}
