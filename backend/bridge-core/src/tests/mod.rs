mod correlation;
mod envelope;
mod registry;
