use crate::gadget::{BarrierFactory, PlanarGadget, Point, WireFactory};
use crate::three_sat::{
    ClausePorts, CrossoverPorts, JunctionPorts, ThreeSatGadgetFactory, VariablePorts,
};

/// Plain rectangle gadget with explicit ports; the reference implementation
/// used throughout the test suite.
#[derive(Debug, Clone)]
pub struct SimpleGadget {
    pub width: i64,
    pub height: i64,
    pub ports: Vec<Point>,
}

impl PlanarGadget for SimpleGadget {
    fn width(&self) -> i64 {
        self.width
    }
    fn height(&self) -> i64 {
        self.height
    }
    fn ports(&self) -> Vec<Point> {
        self.ports.clone()
    }
}

/// Reference wire factory: 3-unit thick wires, ports offset 1 from corners.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleWireFactory;

pub const WIRE_THICKNESS: i64 = 3;
pub const WIRE_PORT_OFFSET: i64 = 1;

impl WireFactory for SimpleWireFactory {
    fn width(&self) -> i64 {
        WIRE_THICKNESS
    }
    fn height(&self) -> i64 {
        WIRE_THICKNESS
    }
    fn port_offset(&self) -> i64 {
        WIRE_PORT_OFFSET
    }
    fn horizontal_wire(&self, width: i64) -> Box<dyn PlanarGadget> {
        assert!(width >= 1);
        Box::new(SimpleGadget {
            width,
            height: WIRE_THICKNESS,
            ports: vec![
                Point::new(0, WIRE_PORT_OFFSET),
                Point::new(width, WIRE_PORT_OFFSET),
            ],
        })
    }
    fn vertical_wire(&self, height: i64) -> Box<dyn PlanarGadget> {
        assert!(height >= 1);
        Box::new(SimpleGadget {
            width: WIRE_THICKNESS,
            height,
            ports: vec![
                Point::new(WIRE_PORT_OFFSET, 0),
                Point::new(WIRE_PORT_OFFSET, height),
            ],
        })
    }
    fn turn_wire(&self) -> Box<dyn PlanarGadget> {
        Box::new(SimpleGadget {
            width: WIRE_THICKNESS,
            height: WIRE_THICKNESS,
            ports: vec![
                Point::new(WIRE_PORT_OFFSET, 0),
                Point::new(WIRE_THICKNESS, WIRE_PORT_OFFSET),
                Point::new(WIRE_PORT_OFFSET, WIRE_THICKNESS),
                Point::new(0, WIRE_PORT_OFFSET),
            ],
        })
    }
}

/// Reference barrier factory: 3x3 minimum, arbitrary rectangles.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleBarrierFactory;

pub const BARRIER_MIN: i64 = 3;

impl BarrierFactory for SimpleBarrierFactory {
    fn min_width(&self) -> i64 {
        BARRIER_MIN
    }
    fn min_height(&self) -> i64 {
        BARRIER_MIN
    }
    fn barrier(&self, width: i64, height: i64) -> Box<dyn PlanarGadget> {
        assert!(width >= 1 && height >= 1);
        Box::new(SimpleGadget {
            width,
            height,
            ports: vec![],
        })
    }
}

/// Reference 3-SAT gadget factory: plain boxes with mid-side ports, enough
/// for exercising the compiler and the layout pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleThreeSatFactory;

impl SimpleThreeSatFactory {
    /// A start gadget with a single railroad port on its right edge.
    pub fn start_gadget(&self) -> Box<dyn PlanarGadget> {
        Box::new(SimpleGadget {
            width: 20,
            height: 14,
            ports: vec![Point::new(20, 7)],
        })
    }

    /// A finish gadget with a single railroad port on its left edge.
    pub fn finish_gadget(&self) -> Box<dyn PlanarGadget> {
        Box::new(SimpleGadget {
            width: 20,
            height: 14,
            ports: vec![Point::new(0, 7)],
        })
    }
}

impl ThreeSatGadgetFactory for SimpleThreeSatFactory {
    fn variable_gadget(&self, positive: bool, negative: bool) -> Box<dyn PlanarGadget> {
        let mut ports = Vec::new();
        match (positive, negative) {
            (true, _) => {
                ports.push(Point::new(15, 0));
                ports.push(Point::new(30, 10));
                if negative {
                    ports.push(Point::new(15, 20));
                }
                ports.push(Point::new(0, 10));
            }
            (false, _) => {
                ports.push(Point::new(0, 10));
                ports.push(Point::new(30, 10));
                if negative {
                    ports.push(Point::new(15, 20));
                }
            }
        }
        Box::new(SimpleGadget {
            width: 30,
            height: 20,
            ports,
        })
    }

    fn variable_ports(&self, positive: bool, negative: bool) -> VariablePorts {
        match (positive, negative) {
            (true, true) => VariablePorts {
                entry: 3,
                exit: 1,
                positive: Some(0),
                negative: Some(2),
            },
            (true, false) => VariablePorts {
                entry: 2,
                exit: 1,
                positive: Some(0),
                negative: None,
            },
            (false, true) => VariablePorts {
                entry: 0,
                exit: 1,
                positive: None,
                negative: Some(2),
            },
            (false, false) => VariablePorts {
                entry: 0,
                exit: 1,
                positive: None,
                negative: None,
            },
        }
    }

    fn clause_gadget(&self) -> Box<dyn PlanarGadget> {
        Box::new(SimpleGadget {
            width: 40,
            height: 20,
            ports: vec![
                Point::new(8, 0),
                Point::new(20, 0),
                Point::new(32, 0),
                Point::new(40, 10),
                Point::new(0, 10),
            ],
        })
    }

    fn clause_ports(&self) -> ClausePorts {
        ClausePorts {
            literals: [0, 1, 2],
            exit: 3,
            entry: 4,
        }
    }

    fn junction_gadget(&self) -> Box<dyn PlanarGadget> {
        Box::new(SimpleGadget {
            width: 20,
            height: 14,
            ports: vec![Point::new(10, 0), Point::new(20, 7), Point::new(0, 7)],
        })
    }

    fn junction_ports(&self) -> JunctionPorts {
        JunctionPorts {
            input: 2,
            clause: 0,
            output: 1,
        }
    }

    fn crossover_gadget(&self, _clockwise: bool) -> Box<dyn PlanarGadget> {
        Box::new(SimpleGadget {
            width: 20,
            height: 20,
            ports: vec![
                Point::new(10, 0),
                Point::new(20, 10),
                Point::new(10, 20),
                Point::new(0, 10),
            ],
        })
    }

    fn crossover_ports(&self, clockwise: bool) -> CrossoverPorts {
        if clockwise {
            CrossoverPorts {
                first_entry: 0,
                second_entry: 1,
                first_exit: 2,
                second_exit: 3,
            }
        } else {
            CrossoverPorts {
                first_entry: 0,
                second_exit: 1,
                first_exit: 2,
                second_entry: 3,
            }
        }
    }
}
