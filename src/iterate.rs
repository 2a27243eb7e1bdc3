// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Iterate
//!
//! The accelerator works on flat vectors. Solvers rarely do: a density may live on a
//! two-dimensional grid, a potential may be stored per band. `Iterate` is the seam between
//! the two, every supported container knows how to flatten itself into a `DVector` and
//! how to rebuild itself from one.

use crate::AccelerationError;
use nalgebra::{DMatrix, DVector, RealField};

/// A container of real values which can be mixed by the accelerator
pub trait Iterate<T: RealField>: Sized {
    /// Everything needed to restore the container from its flattened values
    type Shape: Clone + PartialEq + std::fmt::Debug;

    /// The shape of this container
    fn shape(&self) -> Self::Shape;
    /// Copy the values into a flat vector
    fn to_flat(&self) -> DVector<T>;
    /// Rebuild a container of the given shape from flat values produced by `to_flat`
    fn from_flat(flat: DVector<T>, shape: &Self::Shape) -> Result<Self, AccelerationError>;

    /// Euclidean norm over all values
    fn norm(&self) -> T {
        self.to_flat().norm()
    }
}

fn check_length(expected: usize, found: usize) -> Result<(), AccelerationError> {
    if expected != found {
        return Err(AccelerationError::Reshape(format!(
            "cannot fit {found} values into a container of {expected} elements"
        )));
    }
    Ok(())
}

impl<T: Copy + RealField> Iterate<T> for DVector<T> {
    type Shape = usize;

    fn shape(&self) -> usize {
        self.len()
    }

    fn to_flat(&self) -> DVector<T> {
        self.clone()
    }

    fn from_flat(flat: DVector<T>, shape: &usize) -> Result<Self, AccelerationError> {
        check_length(*shape, flat.len())?;
        Ok(flat)
    }

    fn norm(&self) -> T {
        nalgebra::Matrix::norm(self)
    }
}

/// Matrices are flattened column by column, matching their storage
impl<T: Copy + RealField> Iterate<T> for DMatrix<T> {
    type Shape = (usize, usize);

    fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    fn to_flat(&self) -> DVector<T> {
        DVector::from_column_slice(self.as_slice())
    }

    fn from_flat(flat: DVector<T>, shape: &(usize, usize)) -> Result<Self, AccelerationError> {
        let (nrows, ncols) = *shape;
        check_length(nrows * ncols, flat.len())?;
        Ok(DMatrix::from_column_slice(nrows, ncols, flat.as_slice()))
    }

    fn norm(&self) -> T {
        nalgebra::Matrix::norm(self)
    }
}

impl<T: Copy + RealField> Iterate<T> for Vec<T> {
    type Shape = usize;

    fn shape(&self) -> usize {
        self.len()
    }

    fn to_flat(&self) -> DVector<T> {
        DVector::from_column_slice(self)
    }

    fn from_flat(flat: DVector<T>, shape: &usize) -> Result<Self, AccelerationError> {
        check_length(*shape, flat.len())?;
        Ok(flat.as_slice().to_vec())
    }
}

/// Arrays are flattened in logical (row-major) order, whatever their memory layout
impl<T, D> Iterate<T> for ndarray::Array<T, D>
where
    T: Copy + RealField,
    D: ndarray::Dimension,
{
    type Shape = D;

    fn shape(&self) -> D {
        self.raw_dim()
    }

    fn to_flat(&self) -> DVector<T> {
        DVector::from_iterator(self.len(), self.iter().copied())
    }

    fn from_flat(flat: DVector<T>, shape: &D) -> Result<Self, AccelerationError> {
        check_length(shape.size(), flat.len())?;
        Ok(ndarray::Array::from_shape_vec(
            shape.clone(),
            flat.as_slice().to_vec(),
        )?)
    }
}

#[cfg(test)]
mod test {
    use super::Iterate;
    use nalgebra::{DMatrix, DVector};
    use ndarray::array;

    #[test]
    fn matrix_survives_flattening() {
        let matrix = DMatrix::from_row_slice(2, 3, &[1., 2., 3., 4., 5., 6.]);
        let flat = matrix.to_flat();
        assert_eq!(flat.as_slice(), &[1., 4., 2., 5., 3., 6.]);
        let restored = DMatrix::from_flat(flat, &matrix.shape()).unwrap();
        assert_eq!(restored, matrix);
    }

    #[test]
    fn arrays_flatten_in_logical_order_even_when_transposed() {
        let array = array![[1., 2.], [3., 4.], [5., 6.]];
        let transposed = array.t().to_owned();
        assert_eq!(transposed.to_flat().as_slice(), &[1., 3., 5., 2., 4., 6.]);

        let fortran_layout = array.reversed_axes();
        assert_eq!(fortran_layout.to_flat().as_slice(), &[1., 3., 5., 2., 4., 6.]);
    }

    #[test]
    fn three_dimensional_array_keeps_its_shape() {
        let array =
            ndarray::Array3::from_shape_fn((2, 3, 4), |(i, j, k)| (i * 12 + j * 4 + k) as f64);
        let restored = ndarray::Array3::from_flat(array.to_flat(), &array.raw_dim()).unwrap();
        assert_eq!(restored, array);
    }

    #[test]
    fn wrong_length_is_rejected() {
        let flat = DVector::from_vec(vec![1., 2., 3.]);
        assert!(DMatrix::<f64>::from_flat(flat.clone(), &(2, 2)).is_err());
        assert!(ndarray::Array2::<f64>::from_flat(flat.clone(), &ndarray::Dim([2, 2])).is_err());
        assert!(Vec::<f64>::from_flat(flat, &4).is_err());
    }

    #[test]
    fn norm_matches_flat_norm() {
        let array = array![[3., 0.], [0., 4.]];
        approx::assert_relative_eq!(Iterate::<f64>::norm(&array), 5.);
    }
}
