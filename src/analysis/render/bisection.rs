/*
Copyright 2021 Jakub Lewandowski

This file is part of Upper Air Patterns (UAP).

Upper Air Patterns (UAP) is a free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 3 of the License, or
(at your option) any later version.

Upper Air Patterns (UAP) is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with Upper Air Patterns (UAP). If not, see https://www.gnu.org/licenses/.
*/

//! Module containg methods for conducting
//! binary search (bisection) of positions of
//! searched values in coordinate axes.

use crate::errors::SearchError;
use crate::Float;

/// Core bisection function, simply an implementation
/// of binary search algorithm adapted to searching values
/// in-between the set items. Works for both ascending
/// and descending arrays.
fn binary_search<T: PartialOrd>(array: &[T], x: &T) -> Result<usize, SearchError> {
    let (first, last) = match (array.first(), array.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(SearchError::EmptyArray),
    };

    if x < first && x < last || x > first && x > last {
        return Err(SearchError::OutOfBounds);
    }

    let mut lo = 0;
    let mut hi = array.len() - 1;

    // if the array is sorted descendingly we use a function with reversed signs
    if first < last {
        while lo < hi {
            let mid = (lo + hi) / 2;

            if array[mid] >= *x {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
    } else {
        while lo < hi {
            let mid = (lo + hi) / 2;

            if array[mid] <= *x {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
    }

    Ok(lo)
}

/// Convienience public method to find a closest value
/// to requested to the left of the searched item.
pub fn find_left_closest<T: PartialOrd>(array: &[T], x: &T) -> Result<usize, SearchError> {
    let found_index = binary_search(array, x)?;

    let on_left = if array[0] < array[array.len() - 1] {
        array[found_index] <= *x
    } else {
        array[found_index] >= *x
    };

    if on_left {
        Ok(found_index)
    } else {
        found_index.checked_sub(1).ok_or(SearchError::OutOfBounds)
    }
}

/// Fractional index of the value in the axis,
/// eg. 1.5 for value halfway between the second and third item.
pub fn fractional_index(axis: &[Float], x: Float) -> Result<Float, SearchError> {
    let left = find_left_closest(axis, &x)?;

    if left + 1 >= axis.len() {
        return Ok(left as Float);
    }

    let step = axis[left + 1] - axis[left];

    if step == 0.0 {
        return Ok(left as Float);
    }

    Ok(left as Float + (x - axis[left]) / step)
}
