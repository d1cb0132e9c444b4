mod harness;
mod surface;
