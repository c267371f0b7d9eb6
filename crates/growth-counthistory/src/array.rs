use ndarray::Array1;

use crate::error::Result;
use crate::history::CountHistory;

impl CountHistory {
    pub fn time_bin_edge_array(&self) -> Array1<f64> {
        Array1::from_vec(self.time_bin_edge_list.clone())
    }

    pub fn count_array(&self) -> Array1<u64> {
        Array1::from_vec(self.count_list.clone())
    }

    pub fn time_bin_width_array(&self) -> Array1<f64> {
        Array1::from_vec(self.time_bin_width())
    }

    pub fn time_bin_center_array(&self) -> Array1<f64> {
        Array1::from_vec(self.time_bin_center())
    }

    pub fn count_rate_array(&self) -> Result<Array1<f64>> {
        self.count_rate().map(Array1::from_vec)
    }

    pub fn count_rate_error_array(&self) -> Result<Array1<f64>> {
        self.count_rate_error().map(Array1::from_vec)
    }
}
