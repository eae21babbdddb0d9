// centroidal_sim/src/io.rs

//! Whitespace-separated `.dat` time series in, gain rows out.
//!
//! Every trajectory file carries a leading index column that is skipped.
//! Gains are written without one, one row per gain step.

use std::fs;
use std::path::{Path, PathBuf};

use centroidal_core::prelude::*;
use nalgebra::SVector;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{FilesConfig, GainLayout};

#[derive(Error, Debug)]
pub enum IoError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("invalid trajectory: {0}")]
    Trajectory(#[from] LqrError),
}

/// Reads `N` data columns per row, after the index column.
///
/// Blank lines and lines starting with `#` are ignored. Extra trailing
/// columns are ignored too.
pub fn read_series<const N: usize>(path: &Path) -> Result<Vec<SVector<f64, N>>, IoError> {
    let contents = fs::read_to_string(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    read_rows(path, &contents, 1, N)
        .map(|rows| rows.iter().map(|row| SVector::from_column_slice(row)).collect())
}

fn read_rows(
    path: &Path,
    contents: &str,
    skip: usize,
    columns: usize,
) -> Result<Vec<Vec<f64>>, IoError> {
    let mut rows = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let parse_err = |reason: String| IoError::Parse {
            path: path.to_path_buf(),
            line: idx + 1,
            reason,
        };

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() < skip + columns {
            return Err(parse_err(format!(
                "expected at least {} columns, found {}",
                skip + columns,
                fields.len()
            )));
        }
        let row = fields[skip..skip + columns]
            .iter()
            .map(|field| {
                field
                    .parse::<f64>()
                    .map_err(|e| parse_err(format!("'{}': {}", field, e)))
            })
            .collect::<Result<Vec<f64>, IoError>>()?;
        rows.push(row);
    }
    Ok(rows)
}

/// Reads a wrench series, or substitutes zeros when the file does not exist.
fn read_optional_series(path: &Path, len: usize) -> Result<Vec<SVector<f64, 3>>, IoError> {
    if path.exists() {
        read_series::<3>(path)
    } else {
        warn!(
            "{} not found, using a zero series of {} samples",
            path.display(),
            len
        );
        Ok(vec![SVector::zeros(); len])
    }
}

/// Loads the six artifacts of one trajectory directory.
pub fn load_trajectory(dir: &Path, files: &FilesConfig) -> Result<Trajectory, IoError> {
    let position = read_series::<3>(&dir.join(&files.position))?;
    let velocity = read_series::<3>(&dir.join(&files.velocity))?;
    let orientation = read_series::<4>(&dir.join(&files.orientation))?;
    let angular_velocity = read_series::<3>(&dir.join(&files.angular_velocity))?;
    let force = read_optional_series(&dir.join(&files.force), position.len())?;
    let moment = read_optional_series(&dir.join(&files.moment), position.len())?;

    let trajectory = Trajectory::from_series(
        &position,
        &velocity,
        &orientation,
        &angular_velocity,
        &force,
        &moment,
    )?;
    info!(
        "Loaded trajectory from {} ({} samples)",
        dir.display(),
        trajectory.horizon()
    );
    Ok(trajectory)
}

/// One value per column, `%.18e` style, single space separated.
fn format_rows(rows: &[Vec<f64>]) -> String {
    rows.iter()
        .map(|row| {
            let line: Vec<String> = row.iter().map(|v| format!("{:.18e}", v)).collect();
            line.join(" ") + "\n"
        })
        .collect()
}

fn write_file(path: &Path, contents: &str) -> Result<(), IoError> {
    fs::write(path, contents).map_err(|source| IoError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes the schedule into `dir` following `files.layout`, returning the
/// paths written.
pub fn write_gains(
    schedule: &GainSchedule,
    dir: &Path,
    files: &FilesConfig,
) -> Result<Vec<PathBuf>, IoError> {
    fs::create_dir_all(dir).map_err(|source| IoError::Write {
        path: dir.to_path_buf(),
        source,
    })?;

    let written = match files.layout {
        GainLayout::Split => {
            let (first, second) = schedule.to_split_rows();
            let first_path = dir.join(&files.gains_first);
            let second_path = dir.join(&files.gains_second);
            write_file(&first_path, &format_rows(&first))?;
            write_file(&second_path, &format_rows(&second))?;
            vec![first_path, second_path]
        }
        GainLayout::Combined => {
            let path = dir.join(&files.gains_combined);
            write_file(&path, &format_rows(&schedule.to_flat_rows()))?;
            vec![path]
        }
    };
    info!("Wrote {} gain rows to {:?}", schedule.len(), written);
    Ok(written)
}

/// Reads back a schedule written by [`write_gains`]. The files carry no time
/// index, so the caller supplies the trajectory index of the first row.
pub fn load_gains(
    dir: &Path,
    files: &FilesConfig,
    first_step: usize,
) -> Result<GainSchedule, IoError> {
    let read = |name: &str, columns: usize| -> Result<Vec<Vec<f64>>, IoError> {
        let path = dir.join(name);
        let contents = fs::read_to_string(&path).map_err(|source| IoError::Read {
            path: path.clone(),
            source,
        })?;
        read_rows(&path, &contents, 0, columns)
    };

    let schedule = match files.layout {
        GainLayout::Split => {
            let first = read(&files.gains_first, GAIN_SPLIT_POINT)?;
            let second = read(&files.gains_second, GAIN_SPLIT_POINT)?;
            GainSchedule::from_split_rows(first_step, &first, &second)?
        }
        GainLayout::Combined => {
            let rows = read(&files.gains_combined, 2 * GAIN_SPLIT_POINT)?;
            GainSchedule::from_flat_rows(first_step, &rows)?
        }
    };
    Ok(schedule)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use nalgebra::UnitQuaternion;
    use std::fmt::Write as _;

    /// Writes a `.dat` file with an index column, the way the trajectory
    /// optimizer does.
    pub(crate) fn write_dat(path: &Path, rows: &[Vec<f64>]) {
        let mut out = String::new();
        for (t, row) in rows.iter().enumerate() {
            let values: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            writeln!(out, "{} {}", t, values.join(" ")).unwrap();
        }
        fs::write(path, out).unwrap();
    }

    /// A slowly yawing, hovering base sampled at 1 kHz.
    pub(crate) fn write_trajectory(dir: &Path, files: &FilesConfig, samples: usize, with_wrench: bool) {
        let dt = 0.001;
        let series = |f: &dyn Fn(f64) -> Vec<f64>| -> Vec<Vec<f64>> {
            (0..samples).map(|k| f(k as f64 * dt)).collect()
        };
        write_dat(&dir.join(&files.position), &series(&|s| vec![0.0, 0.0, 0.25 + 0.01 * s]));
        write_dat(&dir.join(&files.velocity), &series(&|_| vec![0.0, 0.0, 0.01]));
        write_dat(
            &dir.join(&files.orientation),
            &series(&|s| {
                let q = UnitQuaternion::from_euler_angles(0.0, 0.0, 0.1 * s).into_inner();
                vec![q.i, q.j, q.k, q.w]
            }),
        );
        write_dat(&dir.join(&files.angular_velocity), &series(&|_| vec![0.0, 0.0, 0.1]));
        if with_wrench {
            write_dat(&dir.join(&files.force), &series(&|_| vec![0.0, 0.0, 21.2877]));
            write_dat(&dir.join(&files.moment), &series(&|_| vec![0.0, 0.0, 0.0]));
        }
    }

    #[test]
    fn test_load_trajectory_skips_index_column() {
        let dir = tempfile::tempdir().unwrap();
        let files = FilesConfig::default();
        write_trajectory(dir.path(), &files, 10, true);

        let traj = load_trajectory(dir.path(), &files).unwrap();
        assert_eq!(traj.horizon(), 10);
        let last = traj.point(9).unwrap();
        assert_eq!(last.position.x, 0.0);
        assert!((last.position.z - (0.25 + 0.01 * 0.009)).abs() < 1e-12);
        assert_eq!(last.force.z, 21.2877);
    }

    #[test]
    fn test_missing_wrench_files_become_zeros() {
        let dir = tempfile::tempdir().unwrap();
        let files = FilesConfig::default();
        write_trajectory(dir.path(), &files, 4, false);

        let traj = load_trajectory(dir.path(), &files).unwrap();
        assert!(traj.points().iter().all(|p| p.force.norm() == 0.0 && p.moment.norm() == 0.0));
    }

    #[test]
    fn test_parse_errors_carry_line_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.dat");

        fs::write(&path, "0 1.0 2.0 3.0\n\n1 1.0 oops 3.0\n").unwrap();
        match read_series::<3>(&path) {
            Err(IoError::Parse { line, reason, .. }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("oops"));
            }
            other => panic!("expected a parse error, got {:?}", other),
        }

        fs::write(&path, "0 1.0 2.0 3.0\n1 1.0 2.0\n").unwrap();
        assert!(matches!(
            read_series::<3>(&path),
            Err(IoError::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_mismatched_lengths_are_a_data_error() {
        let dir = tempfile::tempdir().unwrap();
        let files = FilesConfig::default();
        write_trajectory(dir.path(), &files, 6, true);
        write_dat(&dir.path().join(&files.velocity), &vec![vec![0.0; 3]; 5]);

        assert!(matches!(
            load_trajectory(dir.path(), &files),
            Err(IoError::Trajectory(LqrError::Data(DataError::LengthMismatch {
                series: "velocity",
                ..
            })))
        ));
    }

    #[test]
    fn test_missing_required_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let files = FilesConfig::default();
        assert!(matches!(
            load_trajectory(dir.path(), &files),
            Err(IoError::Read { .. })
        ));
    }

    #[test]
    fn test_format_rows_one_line_per_row() {
        let text = format_rows(&[vec![0.5, -2.0], vec![0.0078125, 3.0]]);
        assert_eq!(
            text,
            "5.000000000000000000e-1 -2.000000000000000000e0\n\
             7.812500000000000000e-3 3.000000000000000000e0\n"
        );
        assert_eq!(format_rows(&[]), "");
    }

    fn sample_schedule() -> GainSchedule {
        let gains = (0..3)
            .map(|k| {
                GainMatrix::from_fn(CONTROL_DIM, STATE_DIM, |i, j| {
                    (k * 100 + i * 13 + j) as f64 * -0.125
                })
            })
            .collect();
        GainSchedule::new(1, gains).unwrap()
    }

    #[test]
    fn test_split_layout_writes_two_halves() {
        let dir = tempfile::tempdir().unwrap();
        let files = FilesConfig::default();
        let schedule = sample_schedule();

        let written = write_gains(&schedule, dir.path(), &files).unwrap();
        assert_eq!(written.len(), 2);

        let first = fs::read_to_string(&written[0]).unwrap();
        let lines: Vec<&str> = first.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].split_whitespace().count(), 39);

        let reloaded = load_gains(dir.path(), &files, 1).unwrap();
        assert_eq!(reloaded, schedule);
    }

    #[test]
    fn test_combined_layout_writes_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = FilesConfig {
            layout: GainLayout::Combined,
            ..FilesConfig::default()
        };
        let schedule = sample_schedule();

        let written = write_gains(&schedule, &dir.path().join("nested"), &files).unwrap();
        assert_eq!(written, vec![dir.path().join("nested").join(&files.gains_combined)]);

        let contents = fs::read_to_string(&written[0]).unwrap();
        assert!(contents.lines().all(|l| l.split_whitespace().count() == 78));
        assert_eq!(load_gains(&dir.path().join("nested"), &files, 1).unwrap(), schedule);
    }
}
