use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use embedded_hal::digital::{ErrorType, OutputPin};

use super::stack::{MockStack, StackChannel};
use super::timer::{TestTimer, TimerChannel};
use super::Node;
use crate::node::Config;
use crate::sensor::AnalogSource;

impl TestSensor {
    pub fn new() -> (SensorHandle, Self) {
        let samples = Arc::new(Mutex::new(VecDeque::new()));
        (SensorHandle { samples: samples.clone() }, Self { samples, last: 0.0 })
    }
}

/// Replays scripted samples; once the script runs out, the last sample
/// repeats.
pub struct TestSensor {
    samples: Arc<Mutex<VecDeque<f32>>>,
    last: f32,
}

impl AnalogSource for TestSensor {
    fn read_sample(&mut self) -> f32 {
        if let Some(sample) = self.samples.lock().unwrap().pop_front() {
            self.last = sample;
        }
        self.last
    }
}

pub struct SensorHandle {
    samples: Arc<Mutex<VecDeque<f32>>>,
}

impl SensorHandle {
    pub fn push_sample(&self, sample: f32) {
        self.samples.lock().unwrap().push_back(sample);
    }
}

impl TestLed {
    pub fn new() -> (LedHandle, Self) {
        let on = Arc::new(Mutex::new(false));
        (LedHandle { on: on.clone() }, Self { on })
    }
}

pub struct TestLed {
    on: Arc<Mutex<bool>>,
}

impl ErrorType for TestLed {
    type Error = Infallible;
}

impl OutputPin for TestLed {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        *self.on.lock().unwrap() = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        *self.on.lock().unwrap() = true;
        Ok(())
    }
}

pub struct LedHandle {
    on: Arc<Mutex<bool>>,
}

impl LedHandle {
    pub fn is_on(&self) -> bool {
        *self.on.lock().unwrap()
    }
}

pub fn setup(config: Config) -> (StackChannel, TimerChannel, SensorHandle, LedHandle, Node) {
    let (stack_channel, mock_stack) = MockStack::new();
    let (timer_channel, mock_timer) = TestTimer::new();
    let (sensor_handle, mock_sensor) = TestSensor::new();
    let (led_handle, mock_led) = TestLed::new();
    let node = Node::new(mock_stack, mock_timer, mock_sensor, mock_led, config);
    (stack_channel, timer_channel, sensor_handle, led_handle, node)
}
