use crate::error::{CliError, Result};
use ensclust::core::models::point_set::LabeledPointSet;
use nalgebra::Point3;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CoordinateRow {
    model: String,
    label: String,
    x: f64,
    y: f64,
    z: f64,
}

/// Reads a `model,label,x,y,z` table into one point set per model.
///
/// Models keep the order of their first row; the rows of one label, in file order, form
/// that label's point sequence.
pub fn read_models(path: &Path) -> Result<Vec<(String, LabeledPointSet)>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| CliError::parsing(path, e))?;

    let mut models: Vec<(String, LabeledPointSet)> = Vec::new();
    let mut index_by_name: HashMap<String, usize> = HashMap::new();
    for result in reader.deserialize::<CoordinateRow>() {
        let row = result.map_err(|e| CliError::parsing(path, e))?;
        let index = *index_by_name.entry(row.model.clone()).or_insert_with(|| {
            models.push((row.model.clone(), LabeledPointSet::new()));
            models.len() - 1
        });
        models[index]
            .1
            .push_point(&row.label, Point3::new(row.x, row.y, row.z))
            .map_err(|e| CliError::parsing(path, e))?;
    }

    debug!(models = models.len(), path = ?path, "Read model coordinates.");
    Ok(models)
}

/// Reads a template table; the `model` column is ignored.
pub fn read_template(path: &Path) -> Result<LabeledPointSet> {
    let models = read_models(path)?;
    let mut template = LabeledPointSet::new();
    for (_, set) in models {
        for (label, points) in set.iter() {
            for point in points {
                template
                    .push_point(label, *point)
                    .map_err(|e| CliError::parsing(path, e))?;
            }
        }
    }
    if template.is_empty() {
        return Err(CliError::parsing(
            path,
            anyhow::anyhow!("template contains no coordinates"),
        ));
    }
    Ok(template)
}

/// Reads a restraint score table: the header names restraints, each row is one query.
pub fn read_scores(path: &Path) -> Result<Vec<HashMap<String, f64>>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| CliError::parsing(path, e))?;
    let headers = reader
        .headers()
        .map_err(|e| CliError::parsing(path, e))?
        .clone();

    let mut rows = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result.map_err(|e| CliError::parsing(path, e))?;
        let mut scores = HashMap::with_capacity(headers.len());
        for (name, value) in headers.iter().zip(record.iter()) {
            if value.is_empty() {
                continue;
            }
            let score: f64 = value.parse().map_err(|_| {
                CliError::parsing(
                    path,
                    anyhow::anyhow!("row {}: '{}' is not a number for '{}'", line + 1, value, name),
                )
            })?;
            scores.insert(name.to_string(), score);
        }
        rows.push(scores);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn groups_rows_by_model_and_label_in_file_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("coords.csv");
        fs::write(
            &path,
            "model,label,x,y,z\n\
             m2,a..1,0,0,0\n\
             m2,a..1,1,0,0\n\
             m1,b,2,2,2\n\
             m2,b, 5, 5, 5\n\
             m1,a..1,3,0,0\n",
        )
        .unwrap();

        let models = read_models(&path).unwrap();

        assert_eq!(models.len(), 2);
        assert_eq!(models[0].0, "m2");
        assert_eq!(models[1].0, "m1");
        let m2 = &models[0].1;
        assert_eq!(
            m2.get("a..1").unwrap(),
            &[Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)]
        );
        assert_eq!(m2.get("b").unwrap(), &[Point3::new(5.0, 5.0, 5.0)]);
        assert_eq!(models[1].1.point_count(), 2);
    }

    #[test]
    fn bad_labels_and_numbers_are_parse_errors() {
        let dir = tempdir().unwrap();
        let bad_label = dir.path().join("label.csv");
        fs::write(&bad_label, "model,label,x,y,z\nm,a..x,0,0,0\n").unwrap();
        let bad_number = dir.path().join("number.csv");
        fs::write(&bad_number, "model,label,x,y,z\nm,a,zero,0,0\n").unwrap();

        assert!(matches!(
            read_models(&bad_label),
            Err(CliError::FileParsing { .. })
        ));
        assert!(matches!(
            read_models(&bad_number),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn template_ignores_the_model_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("template.csv");
        fs::write(&path, "model,label,x,y,z\nref,a,0,0,0\nother,a,1,1,1\n").unwrap();

        let template = read_template(&path).unwrap();

        assert_eq!(template.get("a").unwrap().len(), 2);
    }

    #[test]
    fn empty_template_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("template.csv");
        fs::write(&path, "model,label,x,y,z\n").unwrap();

        assert!(matches!(
            read_template(&path),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn reads_scores_skipping_empty_cells() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scores.csv");
        fs::write(&path, "crosslink,em\n12.5,0.1\n,3\n").unwrap();

        let rows = read_scores(&path).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("crosslink"), Some(&12.5));
        assert_eq!(rows[1].get("crosslink"), None);
        assert_eq!(rows[1].get("em"), Some(&3.0));
    }
}
