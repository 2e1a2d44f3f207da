use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use arrow::array::{Array, ArrayRef, FixedSizeListArray, Float64Array, Int64Array, LargeListArray, ListArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use parquet::arrow::ProjectionMask;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::model::{Column, ColumnData, SubhaloField, SubhaloTable};
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Read `fields` from the `/Subhalo` group of a catalog file.  Dispatch by
/// extension.
///
/// Supported formats:
/// * `.hdf5` / `.h5`  – FoF/Subfind output (needs the `hdf5` feature)
/// * `.parquet`       – one column per field, vector fields as list columns
/// * `.json`          – `{ "Subhalo": { "SubhaloLenType": [[...], ...], ... } }`
pub fn load_subhalos(path: &Path, fields: &[SubhaloField]) -> Result<SubhaloTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "hdf5" | "h5" => load_hdf5(path, fields),
        "parquet" | "pq" => load_parquet(path, fields),
        "json" => load_json(path, fields),
        other => bail!("Unsupported catalog extension: .{other}"),
    };
    table.with_context(|| format!("loading {}", path.display()))
}

/// Shape check shared by the readers: scalars are 1-D, vectors `[n, width]`.
fn check_shape(path: &Path, field: SubhaloField, shape: &[usize]) -> Result<(), PipelineError> {
    let ok = match field.width() {
        1 => shape.len() == 1,
        w => shape.len() == 2 && shape[1] == w,
    };
    if ok {
        Ok(())
    } else {
        Err(PipelineError::FieldShape {
            path: path.to_path_buf(),
            field: field.name(),
            width: field.width(),
            found: shape.to_vec(),
        })
    }
}

fn finish_table(columns: Vec<(SubhaloField, Column)>) -> Result<SubhaloTable> {
    let mut table = SubhaloTable::new();
    for (field, column) in columns {
        let rows = column.len();
        if !table.insert(field, column) {
            bail!(
                "{} has {rows} rows but earlier fields have {}",
                field.name(),
                table.len()
            );
        }
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// HDF5 loader
// ---------------------------------------------------------------------------

#[cfg(feature = "hdf5")]
fn load_hdf5(path: &Path, fields: &[SubhaloField]) -> Result<SubhaloTable> {
    let file = hdf5::File::open(path).context("opening HDF5 file")?;

    let mut columns = Vec::with_capacity(fields.len());
    for &field in fields {
        let name = format!("Subhalo/{}", field.name());
        let dataset = file
            .dataset(&name)
            .with_context(|| format!("opening dataset /{name}"))?;
        check_shape(path, field, &dataset.shape())?;

        let data = if field.is_integral() {
            ColumnData::Int(
                dataset
                    .read_raw::<i64>()
                    .with_context(|| format!("reading /{name}"))?,
            )
        } else {
            ColumnData::Float(
                dataset
                    .read_raw::<f64>()
                    .with_context(|| format!("reading /{name}"))?,
            )
        };
        columns.push((field, Column { width: field.width(), data }));
    }

    finish_table(columns)
}

#[cfg(not(feature = "hdf5"))]
fn load_hdf5(_path: &Path, _fields: &[SubhaloField]) -> Result<SubhaloTable> {
    bail!("HDF5 support not compiled in; rebuild with `--features hdf5`")
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (one key per dataset, as `h5dump` would name them):
///
/// ```json
/// {
///   "Subhalo": {
///     "SubhaloLenType": [[120, 800, 0, 0, 35, 1], ...],
///     "SubhaloMass":    [12.5, ...]
///   }
/// }
/// ```
#[derive(Debug, Deserialize)]
struct JsonCatalog {
    #[serde(rename = "Subhalo")]
    subhalo: BTreeMap<String, JsonValue>,
}

fn load_json(path: &Path, fields: &[SubhaloField]) -> Result<SubhaloTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let catalog: JsonCatalog = serde_json::from_str(&text).context("parsing JSON")?;

    let mut columns = Vec::with_capacity(fields.len());
    for &field in fields {
        let rows = catalog
            .subhalo
            .get(field.name())
            .and_then(|v| v.as_array())
            .with_context(|| format!("missing or invalid '{}' array", field.name()))?;
        let column = json_column(path, field, rows)?;
        columns.push((field, column));
    }

    finish_table(columns)
}

fn json_column(path: &Path, field: SubhaloField, rows: &[JsonValue]) -> Result<Column> {
    let width = field.width();
    let mut cells: Vec<&JsonValue> = Vec::with_capacity(rows.len() * width);

    for row in rows {
        match (width, row.as_array()) {
            (1, None) => cells.push(row),
            (w, Some(components)) if w > 1 && components.len() == w => cells.extend(components),
            (_, components) => {
                let found = match components {
                    Some(c) => vec![rows.len(), c.len()],
                    None => vec![rows.len()],
                };
                check_shape(path, field, &found)?;
            }
        }
    }

    let name = field.name();
    let data = if field.is_integral() {
        ColumnData::Int(
            cells
                .iter()
                .enumerate()
                .map(|(j, v)| {
                    v.as_i64()
                        .with_context(|| format!("{name}[{j}]: not an integer"))
                })
                .collect::<Result<_>>()?,
        )
    } else {
        ColumnData::Float(
            cells
                .iter()
                .enumerate()
                .map(|(j, v)| {
                    v.as_f64()
                        .with_context(|| format!("{name}[{j}]: not a number"))
                })
                .collect::<Result<_>>()?,
        )
    };
    Ok(Column { width, data })
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet catalog.
///
/// Expected schema: one column per [`SubhaloField`] name.  Scalar fields are
/// plain numeric columns; vector fields are `List`, `LargeList` or
/// `FixedSizeList` columns whose entries hold exactly `width` values.  Any
/// integer or float type is accepted and converted.  Only the requested
/// columns are decoded; a requested column absent from the schema fails the
/// load even when the file holds no rows.
fn load_parquet(path: &Path, fields: &[SubhaloField]) -> Result<SubhaloTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;

    let roots = fields
        .iter()
        .map(|field| {
            builder
                .schema()
                .index_of(field.name())
                .map_err(|_| anyhow!("Parquet file missing '{}' column", field.name()))
        })
        .collect::<Result<Vec<usize>>>()?;
    let mask = ProjectionMask::roots(builder.parquet_schema(), roots);
    let reader = builder
        .with_projection(mask)
        .build()
        .context("building parquet reader")?;

    let mut columns: Vec<(SubhaloField, ColumnData)> = fields
        .iter()
        .map(|&f| {
            let data = if f.is_integral() {
                ColumnData::Int(Vec::new())
            } else {
                ColumnData::Float(Vec::new())
            };
            (f, data)
        })
        .collect();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        for (field, data) in columns.iter_mut() {
            let idx = schema
                .index_of(field.name())
                .map_err(|_| anyhow!("Parquet file missing '{}' column", field.name()))?;
            append_parquet_column(batch.column(idx), *field, data)
                .with_context(|| format!("column '{}'", field.name()))?;
        }
    }

    finish_table(
        columns
            .into_iter()
            .map(|(f, data)| (f, Column { width: f.width(), data }))
            .collect(),
    )
}

// -- Parquet / Arrow helpers --

fn append_parquet_column(col: &ArrayRef, field: SubhaloField, out: &mut ColumnData) -> Result<()> {
    let width = field.width();
    match col.data_type() {
        DataType::List(_) | DataType::LargeList(_) | DataType::FixedSizeList(_, _) => {
            for row in 0..col.len() {
                let values = list_value(col, row).with_context(|| format!("row {row}"))?;
                if values.len() != width {
                    bail!("row {row}: {} components, expected {width}", values.len());
                }
                append_numeric(&values, out)?;
            }
            Ok(())
        }
        _ if width == 1 => append_numeric(col, out),
        other => bail!("expected a list column of width {width}, got {other:?}"),
    }
}

/// The values of one list entry.
fn list_value(col: &ArrayRef, row: usize) -> Result<ArrayRef> {
    if col.is_null(row) {
        bail!("null value in list column");
    }
    match col.data_type() {
        DataType::List(_) => Ok(col
            .as_any()
            .downcast_ref::<ListArray>()
            .context("expected ListArray")?
            .value(row)),
        DataType::LargeList(_) => Ok(col
            .as_any()
            .downcast_ref::<LargeListArray>()
            .context("expected LargeListArray")?
            .value(row)),
        DataType::FixedSizeList(_, _) => Ok(col
            .as_any()
            .downcast_ref::<FixedSizeListArray>()
            .context("expected FixedSizeListArray")?
            .value(row)),
        other => bail!("Expected a list column, got {other:?}"),
    }
}

/// Append a primitive array, converting to the accumulator's type.
fn append_numeric(values: &ArrayRef, out: &mut ColumnData) -> Result<()> {
    match out {
        ColumnData::Int(acc) => {
            let converted = cast(values.as_ref(), &DataType::Int64)
                .with_context(|| format!("casting {:?} to Int64", values.data_type()))?;
            let ints = converted
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            if ints.null_count() > 0 {
                bail!("null value in integer column");
            }
            acc.extend(ints.values().iter().copied());
        }
        ColumnData::Float(acc) => {
            let converted = cast(values.as_ref(), &DataType::Float64)
                .with_context(|| format!("casting {:?} to Float64", values.data_type()))?;
            let floats = converted
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array")?;
            acc.extend(floats.iter().map(|v| v.unwrap_or(f64::NAN)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Float32Array, Float64Builder, Int32Builder, ListBuilder};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use serde_json::json;

    use super::*;

    #[test]
    fn json_catalog_reads_requested_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fof_subhalo_tab_033.json");
        let doc = json!({
            "Subhalo": {
                "SubhaloLenType": [[1, 2, 0, 0, 30, 0], [4, 5, 0, 0, 3, 0]],
                "SubhaloMass": [1.5, 2.5],
                "SubhaloVel": [[3.0, 4.0, 0.0], [0.0, 0.0, 1.0]]
            }
        });
        std::fs::write(&path, doc.to_string()).unwrap();

        let table = load_subhalos(
            &path,
            &[SubhaloField::LenType, SubhaloField::Mass, SubhaloField::Vel],
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.column(SubhaloField::LenType).unwrap().get_int(0, 4), 30);
        assert_eq!(table.column(SubhaloField::Mass).unwrap().get(1, 0), 2.5);
        assert_eq!(table.column(SubhaloField::Vel).unwrap().norm(0), 5.0);
    }

    #[test]
    fn json_catalog_rejects_wrong_width() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.json");
        let doc = json!({ "Subhalo": { "SubhaloSpin": [[1.0, 2.0]] } });
        std::fs::write(&path, doc.to_string()).unwrap();

        let err = load_subhalos(&path, &[SubhaloField::Spin]).unwrap_err();
        let shape = err.downcast_ref::<PipelineError>();
        assert!(
            matches!(shape, Some(PipelineError::FieldShape { field: "SubhaloSpin", .. })),
            "unexpected error: {err:#}"
        );
    }

    #[test]
    fn json_catalog_missing_field_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.json");
        std::fs::write(&path, json!({ "Subhalo": {} }).to_string()).unwrap();

        let err = load_subhalos(&path, &[SubhaloField::Sfr]).unwrap_err();
        assert!(format!("{err:#}").contains("SubhaloSFR"));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_subhalos(Path::new("catalog.txt"), &[SubhaloField::Mass]).unwrap_err();
        assert!(err.to_string().contains(".txt"));
    }

    #[test]
    fn parquet_catalog_without_rows_still_needs_its_columns() {
        let schema = Arc::new(Schema::new(vec![Field::new(
            "Unrelated",
            DataType::Float64,
            false,
        )]));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.close().unwrap();

        let err = load_subhalos(&path, &[SubhaloField::LenType, SubhaloField::Mass]).unwrap_err();
        assert!(
            format!("{err:#}").contains("missing 'SubhaloLenType' column"),
            "unexpected error: {err:#}"
        );
    }

    #[test]
    fn parquet_catalog_reads_only_requested_columns() {
        let len_array = {
            let mut b = ListBuilder::new(Int32Builder::new());
            b.values().append_slice(&[0, 0, 0, 0, 21, 0]);
            b.append(true);
            b.finish()
        };
        // Malformed for a scalar field; only fails when requested.
        let mass_array = {
            let mut b = ListBuilder::new(Float64Builder::new());
            b.values().append_slice(&[1.0, 2.0]);
            b.append(true);
            b.finish()
        };
        let schema = Arc::new(Schema::new(vec![
            Field::new("SubhaloLenType", len_array.data_type().clone(), false),
            Field::new("SubhaloMass", mass_array.data_type().clone(), false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(len_array), Arc::new(mass_array)],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_subhalos(&path, &[SubhaloField::LenType]).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.column(SubhaloField::Mass).is_none());
        assert!(load_subhalos(&path, &[SubhaloField::Mass]).is_err());
    }

    #[test]
    fn parquet_catalog_converts_types() {
        let mut len_builder = ListBuilder::new(Int32Builder::new());
        for stars in [10, 50] {
            len_builder.values().append_slice(&[7, 9, 0, 0, stars, 0]);
            len_builder.append(true);
        }
        let mut vel_builder = ListBuilder::new(Float64Builder::new());
        for v in [[1.0, 2.0, 2.0], [0.0, 3.0, 4.0]] {
            vel_builder.values().append_slice(&v);
            vel_builder.append(true);
        }
        let len_array = len_builder.finish();
        let vel_array = vel_builder.finish();
        let mass_array = Float32Array::from(vec![0.25f32, 4.0]);

        let schema = Arc::new(Schema::new(vec![
            Field::new("SubhaloLenType", len_array.data_type().clone(), false),
            Field::new("SubhaloVel", vel_array.data_type().clone(), false),
            Field::new("SubhaloMass", DataType::Float32, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(len_array), Arc::new(vel_array), Arc::new(mass_array)],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_subhalos(
            &path,
            &[SubhaloField::LenType, SubhaloField::Vel, SubhaloField::Mass],
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.column(SubhaloField::LenType).unwrap().get_int(1, 4), 50);
        assert_eq!(table.column(SubhaloField::Vel).unwrap().norm(0), 3.0);
        assert_eq!(table.column(SubhaloField::Mass).unwrap().get(0, 0), 0.25);
    }

    #[cfg(feature = "hdf5")]
    #[test]
    fn hdf5_catalog_widens_subfind_types() {
        use crate::data::fixtures::write_hdf5_catalog;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fof_subhalo_tab_033.hdf5");
        write_hdf5_catalog(
            &path,
            &[
                (SubhaloField::LenType, vec![1.0, 2.0, 0.0, 0.0, 21.0, 0.0, 3.0, 4.0, 0.0, 0.0, 20.0, 0.0]),
                (SubhaloField::Spin, vec![3.0, 4.0, 0.0, 0.5, 0.0, 0.0]),
                (SubhaloField::Mass, vec![0.25, 12.5]),
            ],
        )
        .unwrap();

        let table = load_subhalos(
            &path,
            &[SubhaloField::LenType, SubhaloField::Spin, SubhaloField::Mass],
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        let len_type = table.column(SubhaloField::LenType).unwrap();
        assert!(matches!(len_type.data, ColumnData::Int(_)));
        assert_eq!(len_type.get_int(0, 4), 21);
        assert_eq!(len_type.get_int(1, 4), 20);
        assert_eq!(table.column(SubhaloField::Spin).unwrap().norm(0), 5.0);
        assert_eq!(table.column(SubhaloField::Spin).unwrap().get(1, 0), 0.5);
        assert_eq!(table.column(SubhaloField::Mass).unwrap().get(1, 0), 12.5);

        let err = load_subhalos(&path, &[SubhaloField::Vmax]).unwrap_err();
        assert!(format!("{err:#}").contains("/Subhalo/SubhaloVmax"));
    }

    #[cfg(feature = "hdf5")]
    #[test]
    fn hdf5_catalog_rejects_wrong_width() {
        use crate::data::fixtures::write_dataset;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.hdf5");
        {
            let file = hdf5::File::create(&path).unwrap();
            let group = file.create_group("Subhalo").unwrap();
            // Six values laid out as [3, 2] instead of [2, 3].
            group
                .new_dataset::<f32>()
                .shape((3, 2))
                .create("SubhaloVel")
                .unwrap()
                .write_raw(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0][..])
                .unwrap();
            write_dataset(&group, SubhaloField::Vmax, &[100.0f32, 200.0, 300.0]).unwrap();
        }

        assert_eq!(load_subhalos(&path, &[SubhaloField::Vmax]).unwrap().len(), 3);
        let err = load_subhalos(&path, &[SubhaloField::Vel]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::FieldShape { field: "SubhaloVel", width: 3, .. })
        ));
    }
}
