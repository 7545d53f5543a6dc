//! Labeled n-dimensional arrays.
//!
//! A thin coordinate layer over `ndarray::ArrayD<f64>`: every axis carries a
//! name and an ordered list of labels, and binary operations align operands
//! by axis name rather than position. Missing values are `NaN`.

use std::fmt;

use ndarray::{ArrayD, ArrayView1, ArrayViewMut1, Axis, IxDyn, Zip};

use crate::error::{PipelineError, Result};

/// A named axis with its ordered labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coord {
    /// Axis name (e.g. `"case"`, `"r"`, `"t"`).
    pub name: String,
    /// Labels in axis order.
    pub labels: Vec<String>,
}

impl Coord {
    /// Creates a coordinate from any iterable of labels.
    pub fn new(name: &str, labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.to_string(),
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Position of `label` on this axis.
    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }
}

/// Dense array of `f64` with named, labeled axes.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledArray {
    coords: Vec<Coord>,
    values: ArrayD<f64>,
}

impl LabeledArray {
    /// Wraps `values` with the given coordinates.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Shape` if the coordinate lengths do not match
    /// the array shape or an axis name is repeated.
    pub fn new(coords: Vec<Coord>, values: ArrayD<f64>) -> Result<Self> {
        let expected: Vec<usize> = coords.iter().map(|c| c.labels.len()).collect();
        if expected.as_slice() != values.shape() {
            return Err(PipelineError::Shape(format!(
                "coordinates imply shape {expected:?}, data has {:?}",
                values.shape()
            )));
        }
        for (i, c) in coords.iter().enumerate() {
            if coords[..i].iter().any(|o| o.name == c.name) {
                return Err(PipelineError::Shape(format!("axis `{}` repeated", c.name)));
            }
        }
        Ok(Self { coords, values })
    }

    /// Array filled with a constant.
    pub fn filled(coords: Vec<Coord>, value: f64) -> Self {
        let shape: Vec<usize> = coords.iter().map(|c| c.labels.len()).collect();
        Self {
            coords,
            values: ArrayD::from_elem(IxDyn(&shape), value),
        }
    }

    /// Zero-dimensional array holding one value.
    pub fn scalar(value: f64) -> Self {
        Self::filled(Vec::new(), value)
    }

    /// Builds an array from sparse records.
    ///
    /// Each record is a label tuple (one label per axis, in `dims` order) and
    /// a value. Labels are ordered by first appearance; cells without a record
    /// are `NaN`.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Shape` if a record has the wrong arity.
    pub fn from_records<I>(dims: &[String], records: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Vec<String>, f64)>,
    {
        let mut coords: Vec<Coord> = dims.iter().map(|d| Coord::new(d, Vec::<String>::new())).collect();
        let mut cells = Vec::new();
        for (key, value) in records {
            if key.len() != dims.len() {
                return Err(PipelineError::Shape(format!(
                    "record {key:?} has {} labels, expected {}",
                    key.len(),
                    dims.len()
                )));
            }
            let mut index = Vec::with_capacity(key.len());
            for (coord, label) in coords.iter_mut().zip(key) {
                let pos = match coord.position(&label) {
                    Some(p) => p,
                    None => {
                        coord.labels.push(label);
                        coord.labels.len() - 1
                    }
                };
                index.push(pos);
            }
            cells.push((index, value));
        }

        let mut array = Self::filled(coords, f64::NAN);
        for (index, value) in cells {
            if let Some(cell) = array.values.get_mut(index.as_slice()) {
                *cell = value;
            }
        }
        Ok(array)
    }

    /// Coordinates in axis order.
    pub fn coords(&self) -> &[Coord] {
        &self.coords
    }

    /// Underlying values.
    pub fn values(&self) -> &ArrayD<f64> {
        &self.values
    }

    /// Axis names in order.
    pub fn dims(&self) -> impl Iterator<Item = &str> {
        self.coords.iter().map(|c| c.name.as_str())
    }

    /// Whether the array has an axis called `name`.
    pub fn has_axis(&self, name: &str) -> bool {
        self.coords.iter().any(|c| c.name == name)
    }

    /// Coordinate of the named axis.
    pub fn coord(&self, name: &str) -> Option<&Coord> {
        self.coords.iter().find(|c| c.name == name)
    }

    /// Labels of the named axis.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::MissingAxis` if the axis does not exist.
    pub fn labels(&self, name: &str) -> Result<&[String]> {
        let i = self.axis_index(name)?;
        Ok(&self.coords[i].labels)
    }

    fn axis_index(&self, name: &str) -> Result<usize> {
        self.coords
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| PipelineError::MissingAxis {
                axis: name.to_string(),
                available: self.dims().collect::<Vec<_>>().join(", "),
            })
    }

    fn label_index(&self, axis: usize, label: &str) -> Result<usize> {
        self.coords[axis]
            .position(label)
            .ok_or_else(|| PipelineError::LabelNotFound {
                axis: self.coords[axis].name.clone(),
                label: label.to_string(),
            })
    }

    /// Value at the given `(axis, label)` selectors, one per axis.
    ///
    /// Returns `None` if an axis or label is unknown, or if the selectors do
    /// not cover every axis.
    pub fn get(&self, at: &[(&str, &str)]) -> Option<f64> {
        let index = self.point_index(at)?;
        self.values.get(index.as_slice()).copied()
    }

    /// Sets the value at the given selectors.
    ///
    /// # Errors
    ///
    /// Returns `MissingAxis`/`LabelNotFound` if a selector does not resolve,
    /// or `Shape` if the selectors do not cover every axis.
    pub fn set(&mut self, at: &[(&str, &str)], value: f64) -> Result<()> {
        let mut index = vec![usize::MAX; self.coords.len()];
        for (axis, label) in at {
            let i = self.axis_index(axis)?;
            index[i] = self.label_index(i, label)?;
        }
        if index.contains(&usize::MAX) {
            return Err(PipelineError::Shape(format!(
                "selectors {at:?} do not cover axes [{}]",
                self.dims().collect::<Vec<_>>().join(", ")
            )));
        }
        if let Some(cell) = self.values.get_mut(index.as_slice()) {
            *cell = value;
        }
        Ok(())
    }

    fn point_index(&self, at: &[(&str, &str)]) -> Option<Vec<usize>> {
        if at.len() != self.coords.len() {
            return None;
        }
        self.coords
            .iter()
            .map(|c| {
                let (_, label) = at.iter().find(|(axis, _)| *axis == c.name)?;
                c.position(label)
            })
            .collect()
    }

    /// Selects one label of an axis and drops that axis.
    ///
    /// # Errors
    ///
    /// Returns `MissingAxis` or `LabelNotFound`.
    pub fn sel(&self, axis: &str, label: &str) -> Result<Self> {
        let i = self.axis_index(axis)?;
        let pos = self.label_index(i, label)?;
        let mut coords = self.coords.clone();
        coords.remove(i);
        Ok(Self {
            coords,
            values: self.values.index_axis(Axis(i), pos).to_owned(),
        })
    }

    /// Keeps the listed labels of an axis, in the listed order.
    ///
    /// # Errors
    ///
    /// Returns `MissingAxis`, or `LabelNotFound` for the first label absent
    /// from the axis.
    pub fn select<S: AsRef<str>>(&self, axis: &str, labels: &[S]) -> Result<Self> {
        let i = self.axis_index(axis)?;
        let indices = labels
            .iter()
            .map(|l| self.label_index(i, l.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let mut coords = self.coords.clone();
        coords[i].labels = labels.iter().map(|l| l.as_ref().to_string()).collect();
        Ok(Self {
            coords,
            values: self.values.select(Axis(i), &indices),
        })
    }

    /// Conforms an axis to `labels`: labels absent from the array become
    /// `NaN`, labels present in the array but not listed are an error.
    ///
    /// # Errors
    ///
    /// Returns `MissingAxis`, or `LabelMismatch` naming `context` when the
    /// array carries labels outside `labels`.
    pub fn align(&self, axis: &str, labels: &[String], context: &str) -> Result<Self> {
        let i = self.axis_index(axis)?;
        let current = &self.coords[i].labels;
        if current.iter().any(|l| !labels.contains(l)) {
            return Err(PipelineError::label_mismatch(axis, context, labels, current));
        }
        self.reindex(axis, labels)
    }

    /// Conforms an axis to `labels`, filling `NaN` for new labels and
    /// dropping labels not listed.
    ///
    /// # Errors
    ///
    /// Returns `MissingAxis` if the axis does not exist.
    pub fn reindex(&self, axis: &str, labels: &[String]) -> Result<Self> {
        let i = self.axis_index(axis)?;
        let mut coords = self.coords.clone();
        coords[i].labels = labels.to_vec();
        let mut out = Self::filled(coords, f64::NAN);
        for (new_pos, label) in labels.iter().enumerate() {
            if let Some(old_pos) = self.coords[i].position(label) {
                out.values
                    .index_axis_mut(Axis(i), new_pos)
                    .assign(&self.values.index_axis(Axis(i), old_pos));
            }
        }
        Ok(out)
    }

    /// Sums over an axis, skipping `NaN`. A lane with no finite values sums
    /// to `NaN`.
    ///
    /// # Errors
    ///
    /// Returns `MissingAxis` if the axis does not exist.
    pub fn sum(&self, axis: &str) -> Result<Self> {
        let i = self.axis_index(axis)?;
        let mut coords = self.coords.clone();
        coords.remove(i);
        let values = self.values.map_axis(Axis(i), |lane| {
            let mut seen = false;
            let mut total = 0.0;
            for &v in lane.iter().filter(|v| !v.is_nan()) {
                seen = true;
                total += v;
            }
            if seen { total } else { f64::NAN }
        });
        Ok(Self { coords, values })
    }

    /// Overwrites the hyperplane at `label` of `axis` with `plane`, which must
    /// carry exactly the remaining axes (in any order).
    ///
    /// # Errors
    ///
    /// Returns `MissingAxis`/`LabelNotFound` for a bad selector and
    /// `Shape`/`LabelMismatch` if `plane` does not fit.
    pub fn assign_sel(&mut self, axis: &str, label: &str, plane: &Self) -> Result<()> {
        let i = self.axis_index(axis)?;
        let pos = self.label_index(i, label)?;
        let mut rest = self.coords.clone();
        rest.remove(i);
        let values = plane.conform_to(&rest, &format!("{axis}={label}"))?;
        self.values.index_axis_mut(Axis(i), pos).assign(&values);
        Ok(())
    }

    /// Copies the hyperplane at `from` onto `to` along `axis`.
    ///
    /// # Errors
    ///
    /// Returns `MissingAxis` or `LabelNotFound`.
    pub fn copy_sel(&mut self, axis: &str, from: &str, to: &str) -> Result<()> {
        let plane = self.sel(axis, from)?;
        self.assign_sel(axis, to, &plane)
    }

    /// Renames an axis.
    ///
    /// # Errors
    ///
    /// Returns `MissingAxis` if `from` does not exist, or `Shape` if `to` is
    /// already taken by another axis.
    pub fn rename(mut self, from: &str, to: &str) -> Result<Self> {
        let i = self.axis_index(from)?;
        if from != to && self.has_axis(to) {
            return Err(PipelineError::Shape(format!("axis `{to}` already exists")));
        }
        self.coords[i].name = to.to_string();
        Ok(self)
    }

    /// Applies `f` to every value.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            coords: self.coords.clone(),
            values: self.values.mapv(f),
        }
    }

    /// Multiplies every value by `factor`.
    pub fn scale(&self, factor: f64) -> Self {
        self.map(|v| v * factor)
    }

    /// Rewrites every lane along `axis` in place of a copy.
    ///
    /// `f` receives the source lane and a mutable output lane of equal length.
    ///
    /// # Errors
    ///
    /// Returns `MissingAxis` if the axis does not exist.
    pub fn map_lanes(
        &self,
        axis: &str,
        f: impl Fn(ArrayView1<'_, f64>, ArrayViewMut1<'_, f64>),
    ) -> Result<Self> {
        let i = self.axis_index(axis)?;
        let mut out = self.values.clone();
        Zip::from(out.lanes_mut(Axis(i)))
            .and(self.values.lanes(Axis(i)))
            .for_each(|dst, src| f(src, dst));
        Ok(Self {
            coords: self.coords.clone(),
            values: out,
        })
    }

    /// Combines two arrays element-wise, aligning axes by name.
    ///
    /// The result has this array's axes followed by the other array's extra
    /// axes; each operand is broadcast over the axes it lacks.
    ///
    /// # Errors
    ///
    /// Returns `LabelMismatch` if a shared axis has different labels.
    pub fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Result<Self> {
        let mut coords = self.coords.clone();
        for c in &other.coords {
            match self.coord(&c.name) {
                Some(mine) if mine.labels != c.labels => {
                    return Err(PipelineError::label_mismatch(
                        &c.name,
                        "element-wise operation",
                        &mine.labels,
                        &c.labels,
                    ));
                }
                Some(_) => {}
                None => coords.push(c.clone()),
            }
        }

        let shape: Vec<usize> = coords.iter().map(|c| c.labels.len()).collect();
        let lhs = self.expand_to(&coords);
        let rhs = other.expand_to(&coords);
        let broadcast_err = || PipelineError::Shape(format!("cannot broadcast to {shape:?}"));
        let lhs = lhs.broadcast(IxDyn(&shape)).ok_or_else(broadcast_err)?;
        let rhs = rhs.broadcast(IxDyn(&shape)).ok_or_else(broadcast_err)?;
        let values = Zip::from(&lhs).and(&rhs).map_collect(|&a, &b| f(a, b));
        Ok(Self { coords, values })
    }

    /// Permutes this array's axes into the order they appear in `target`
    /// and inserts length-one axes for the ones it lacks.
    fn expand_to(&self, target: &[Coord]) -> ArrayD<f64> {
        let order: Vec<usize> = target
            .iter()
            .filter_map(|c| self.coords.iter().position(|m| m.name == c.name))
            .collect();
        let mut values = self.values.clone().permuted_axes(IxDyn(&order));
        for (i, c) in target.iter().enumerate() {
            if !self.has_axis(&c.name) {
                values.insert_axis_inplace(Axis(i));
            }
        }
        values
    }

    /// Element-wise sum.
    ///
    /// # Errors
    ///
    /// See [`LabeledArray::zip_with`].
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a + b)
    }

    /// Element-wise product.
    ///
    /// # Errors
    ///
    /// See [`LabeledArray::zip_with`].
    pub fn mul(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a * b)
    }

    /// Element-wise quotient.
    ///
    /// # Errors
    ///
    /// See [`LabeledArray::zip_with`].
    pub fn div(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a / b)
    }

    /// Stacks arrays along a new leading axis.
    ///
    /// # Errors
    ///
    /// Returns `Shape` if `labels` and `arrays` differ in length or are
    /// empty, and `LabelMismatch` if the arrays do not share coordinates.
    pub fn concat(axis: &str, labels: &[String], arrays: &[Self]) -> Result<Self> {
        let Some(first) = arrays.first() else {
            return Err(PipelineError::Shape(format!("nothing to concatenate along `{axis}`")));
        };
        if labels.len() != arrays.len() {
            return Err(PipelineError::Shape(format!(
                "{} labels for {} arrays along `{axis}`",
                labels.len(),
                arrays.len()
            )));
        }

        let mut views = Vec::with_capacity(arrays.len());
        for (label, a) in labels.iter().zip(arrays) {
            let aligned = a.conform_to(&first.coords, &format!("{axis}={label}"))?;
            views.push(aligned);
        }
        let stacked = ndarray::stack(
            Axis(0),
            &views.iter().map(|v| v.view()).collect::<Vec<_>>(),
        )
        .map_err(|e| PipelineError::Shape(e.to_string()))?;

        let mut coords = vec![Coord::new(axis, labels.iter().cloned())];
        coords.extend(first.coords.iter().cloned());
        Self::new(coords, stacked)
    }

    /// Values of this array in the axis order of `coords`, which must name
    /// the same axes with identical labels.
    fn conform_to(&self, coords: &[Coord], context: &str) -> Result<ArrayD<f64>> {
        if coords.len() != self.coords.len() {
            return Err(PipelineError::Shape(format!(
                "{context}: axes [{}] differ from [{}]",
                self.dims().collect::<Vec<_>>().join(", "),
                coords.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", ")
            )));
        }
        for c in coords {
            let mine = self.coord(&c.name).ok_or_else(|| PipelineError::MissingAxis {
                axis: c.name.clone(),
                available: self.dims().collect::<Vec<_>>().join(", "),
            })?;
            if mine.labels != c.labels {
                return Err(PipelineError::label_mismatch(&c.name, context, &c.labels, &mine.labels));
            }
        }
        Ok(self.expand_to(coords))
    }
}

impl fmt::Display for LabeledArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self
            .coords
            .iter()
            .map(|c| format!("{}: {}", c.name, c.labels.len()))
            .collect();
        write!(f, "LabeledArray({})", dims.join(", "))
    }
}
