use pyo3::prelude::*;
use pyo3::exceptions::PyValueError;
use crate::display::compass_frame;
use crate::search::{SearchPlanner, Turn};
use crate::signal::{angle_for_rssi, RssiSmoother, SignalRange};

#[pyclass]
pub struct PyRssiSmoother{
    inner: RssiSmoother,
}

#[pymethods]
impl PyRssiSmoother{
    #[new]
    #[pyo3(signature = (window = 5))]
    fn new(window: usize) -> PyResult<Self>{
        if window == 0{
            return Err(PyValueError::new_err("window must be at least 1"));
        }
        Ok(PyRssiSmoother{ inner: RssiSmoother::new(window) })
    }

    fn push(&mut self, rssi: f32) -> f32{
        self.inner.push(rssi)
    }

    fn average(&self) -> Option<f32>{
        self.inner.average()
    }

    fn __len__(&self) -> usize{
        self.inner.len()
    }
}

#[pyclass]
pub struct PySearchPlanner{
    inner: SearchPlanner,
}

#[pymethods]
impl PySearchPlanner{
    #[new]
    #[pyo3(signature = (window = 5, min_rssi = -90.0, max_rssi = -30.0))]
    fn new(window: usize, min_rssi: f32, max_rssi: f32) -> PyResult<Self>{
        if window == 0 || max_rssi <= min_rssi{
            return Err(PyValueError::new_err("need window >= 1 and max_rssi > min_rssi"));
        }
        Ok(PySearchPlanner{
            inner: SearchPlanner::new(window, SignalRange{ min_rssi, max_rssi }),
        })
    }

    /// Returns (label, smoothed, suggested_turn, message)
    fn decide(&mut self, rssi: Option<f32>) -> (String, Option<f32>, Option<String>, Option<String>){
        let decision = self.inner.decide(rssi);
        let turn = decision.turn().map(|t| match t{
            Turn::Left => "left".to_string(),
            Turn::Right => "right".to_string(),
        });
        (
            decision.label().to_string(),
            decision.smoothed(),
            turn,
            decision.message().map(|m| m.to_string()),
        )
    }

    fn turn(&mut self, direction: &str) -> PyResult<u16>{
        let turn = match direction{
            "left" => Turn::Left,
            "right" => Turn::Right,
            _ => return Err(PyValueError::new_err(format!("unknown direction '{}'", direction))),
        };
        Ok(self.inner.apply_turn(turn).degrees())
    }

    fn heading(&self) -> u16{
        self.inner.heading().degrees()
    }

    fn previous(&self) -> Option<f32>{
        self.inner.previous()
    }

    fn reset(&mut self){
        self.inner.reset();
    }
}

#[pyfunction]
fn rssi_to_angle(rssi: f32) -> f32{
    angle_for_rssi(rssi)
}

/// Compass screen as raw SSD1306 page bytes
#[pyfunction]
#[pyo3(signature = (heading, rssi = None))]
fn render_compass(heading: f32, rssi: Option<f32>) -> Vec<u8>{
    compass_frame(heading, rssi).as_bytes().to_vec()
}

#[pymodule]
fn phonefind(_py: Python, m: &PyModule) -> PyResult<()>{
    m.add_class::<PyRssiSmoother>()?;
    m.add_class::<PySearchPlanner>()?;
    m.add_function(wrap_pyfunction!(rssi_to_angle, m)?)?;
    m.add_function(wrap_pyfunction!(render_compass, m)?)?;
    Ok(())
}

#[cfg(test)]
mod tests{
    use super::*;

    #[test]
    fn test_py_smoother(){
        let mut smoother = PyRssiSmoother::new(2).unwrap();
        assert_eq!(smoother.push(-40.0), -40.0);
        assert_eq!(smoother.push(-60.0), -50.0);
        assert_eq!(smoother.__len__(), 2);
    }

    #[test]
    fn test_py_planner_decide(){
        let mut planner = PySearchPlanner::new(5, -90.0, -30.0).unwrap();
        let (label, smoothed, turn, message) = planner.decide(Some(-60.0));
        assert_eq!(label, "first_fix");
        assert_eq!(smoothed, Some(-60.0));
        assert!(turn.is_none());
        assert!(message.is_none());

        let (label, _, turn, _) = planner.decide(None);
        assert_eq!(label, "not_found");
        assert_eq!(turn.as_deref(), Some("left"));
        assert_eq!(planner.turn("left").unwrap(), 270);
    }

    #[test]
    fn test_py_render_size(){
        assert_eq!(render_compass(0.0, None).len(), crate::display::FRAME_SIZE);
    }
}
