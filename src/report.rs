use polars::prelude::*;

use crate::monthly::MonthlyRecord;
use crate::season::AggregateEntry;

fn hour_columns(hours: impl Iterator<Item = [Option<f64>; 3]>) -> [Vec<Option<f64>>; 3] {
    let mut lecture = Vec::new();
    let mut practice = Vec::new();
    let mut lab = Vec::new();
    for [l, p, b] in hours {
        lecture.push(l);
        practice.push(p);
        lab.push(b);
    }
    [lecture, practice, lab]
}

/// Monthly records as a frame with one row per record, in sheet order.
pub fn monthly_frame(records: &[MonthlyRecord]) -> PolarsResult<DataFrame> {
    let rows: Vec<i32> = records.iter().map(|r| r.row as i32).collect();
    let days: Vec<i32> = records.iter().map(|r| r.day as i32).collect();
    let disciplines: Vec<&str> = records.iter().map(|r| r.discipline.as_str()).collect();
    let groups: Vec<&str> = records.iter().map(|r| r.group.as_str()).collect();
    let load_types: Vec<&str> = records.iter().map(|r| r.load_type.as_str()).collect();
    let [lecture, practice, lab] = hour_columns(
        records
            .iter()
            .map(|r| [r.hours.lecture, r.hours.practice, r.hours.lab]),
    );

    DataFrame::new(vec![
        Series::new(PlSmallStr::from_static("row"), rows).into_column(),
        Series::new(PlSmallStr::from_static("day"), days).into_column(),
        Series::new(PlSmallStr::from_static("discipline"), disciplines).into_column(),
        Series::new(PlSmallStr::from_static("group"), groups).into_column(),
        Series::new(PlSmallStr::from_static("load_type"), load_types).into_column(),
        Series::new(PlSmallStr::from_static("lecture"), lecture).into_column(),
        Series::new(PlSmallStr::from_static("practice"), practice).into_column(),
        Series::new(PlSmallStr::from_static("lab"), lab).into_column(),
    ])
}

pub fn season_frame(entries: &[AggregateEntry]) -> PolarsResult<DataFrame> {
    let rows: Vec<i32> = entries.iter().map(|e| e.row as i32).collect();
    let disciplines: Vec<&str> = entries.iter().map(|e| e.key.discipline.as_str()).collect();
    let groups: Vec<&str> = entries.iter().map(|e| e.key.group.as_str()).collect();
    let load_types: Vec<&str> = entries.iter().map(|e| e.key.load_type.as_str()).collect();
    let [lecture, practice, lab] = hour_columns(
        entries
            .iter()
            .map(|e| [e.totals.lecture, e.totals.practice, e.totals.lab]),
    );

    DataFrame::new(vec![
        Series::new(PlSmallStr::from_static("row"), rows).into_column(),
        Series::new(PlSmallStr::from_static("discipline"), disciplines).into_column(),
        Series::new(PlSmallStr::from_static("group"), groups).into_column(),
        Series::new(PlSmallStr::from_static("load_type"), load_types).into_column(),
        Series::new(PlSmallStr::from_static("lecture"), lecture).into_column(),
        Series::new(PlSmallStr::from_static("practice"), practice).into_column(),
        Series::new(PlSmallStr::from_static("lab"), lab).into_column(),
    ])
}

/// Hour sums per (discipline, group) with a `total` column, sorted by
/// discipline then group. Works on either frame above.
pub fn hours_by_discipline(df: &DataFrame) -> PolarsResult<DataFrame> {
    df.clone()
        .lazy()
        .group_by([col("discipline"), col("group")])
        .agg([
            col("lecture").fill_null(lit(0.0)).sum(),
            col("practice").fill_null(lit(0.0)).sum(),
            col("lab").fill_null(lit(0.0)).sum(),
        ])
        .with_column((col("lecture") + col("practice") + col("lab")).alias("total"))
        .sort_by_exprs(
            [col("discipline"), col("group")],
            SortMultipleOptions::default(),
        )
        .collect()
}
