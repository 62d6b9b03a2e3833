//! One generator instance: the engine plus its request and response records.
//!
//! All three are sized once in [`GeneratorInstance::create`] and only
//! overwritten in place afterwards.

use tracing::debug;

use crate::config::GeneratorConfig;
use crate::engine::{GeneratorEngine, JerkStepper, Request, Response};
use crate::error::BlockConfigError;
use otg_common::motion::ResultCode;

/// Engine, request and response for a fixed DOF count and sample period.
#[derive(Debug)]
pub struct GeneratorInstance<E: GeneratorEngine = JerkStepper> {
    engine: E,
    request: Request,
    response: Response,
    sample_period: f64,
}

impl<E: GeneratorEngine> GeneratorInstance<E> {
    /// Allocate engine and records for `config`.
    ///
    /// Fails on a DOF count of zero or above capacity. Limits are not
    /// inspected here.
    pub fn create(config: &GeneratorConfig) -> Result<Self, BlockConfigError> {
        config.check_capacity()?;
        let engine =
            E::new(config.dofs, config.sample_period).map_err(BlockConfigError::Allocation)?;
        let request = Request::new(config).map_err(BlockConfigError::Allocation)?;
        let response = Response::new(config.dofs).map_err(BlockConfigError::Allocation)?;
        debug!(
            dofs = config.dofs,
            sample_period = config.sample_period,
            "generator instance created"
        );
        Ok(Self {
            engine,
            request,
            response,
            sample_period: config.sample_period,
        })
    }

    #[inline]
    pub fn dofs(&self) -> usize {
        self.request.dofs()
    }

    #[inline]
    pub fn sample_period(&self) -> f64 {
        self.sample_period
    }

    /// Request as last assembled by the tick.
    #[inline]
    pub fn request(&self) -> &Request {
        &self.request
    }

    #[inline]
    pub(crate) fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    /// Response written by the last advance.
    #[inline]
    pub fn response(&self) -> &Response {
        &self.response
    }

    #[inline]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Run one engine advance on the current request.
    #[inline]
    pub fn advance(&mut self) -> ResultCode {
        self.engine.advance(&self.request, &mut self.response)
    }

    /// Release the engine and its records.
    pub fn destroy(self) {
        debug!(dofs = self.dofs(), "generator instance destroyed");
    }
}
