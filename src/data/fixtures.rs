//! Catalog files in the native FoF/Subfind layout, for tests.

#[cfg(feature = "hdf5")]
use std::path::Path;

#[cfg(feature = "hdf5")]
use super::model::SubhaloField;

/// Write `/Subhalo/<Field>` datasets the way Subfind stores them: int32
/// `SubhaloLenType`, float32 everything else, `[n]` or `[n, width]` shaped.
/// `columns` holds each field's row-major values.
#[cfg(feature = "hdf5")]
pub fn write_hdf5_catalog(path: &Path, columns: &[(SubhaloField, Vec<f64>)]) -> hdf5::Result<()> {
    let file = hdf5::File::create(path)?;
    let group = file.create_group("Subhalo")?;
    for (field, values) in columns {
        if field.is_integral() {
            let ints: Vec<i32> = values.iter().map(|&v| v as i32).collect();
            write_dataset(&group, *field, &ints)?;
        } else {
            let floats: Vec<f32> = values.iter().map(|&v| v as f32).collect();
            write_dataset(&group, *field, &floats)?;
        }
    }
    Ok(())
}

#[cfg(feature = "hdf5")]
pub fn write_dataset<T: hdf5::H5Type>(
    group: &hdf5::Group,
    field: SubhaloField,
    values: &[T],
) -> hdf5::Result<()> {
    let width = field.width();
    let rows = values.len() / width;
    let dataset = if width == 1 {
        group.new_dataset::<T>().shape(rows).create(field.name())?
    } else {
        group.new_dataset::<T>().shape((rows, width)).create(field.name())?
    };
    dataset.write_raw(values)
}
