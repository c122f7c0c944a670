//! Wire constants: command ids, type tags, variable ids, sentinels.

/// API version reported by `CMD_GETVERSION`.
pub const API_VERSION: i32 = 8;

/// Sentinel for doubles that have no meaningful value (e.g. vehicle not on road).
pub const INVALID_DOUBLE_VALUE: f64 = -1_073_741_824.0;
/// Sentinel for ints that have no meaningful value.
pub const INVALID_INT_VALUE: i32 = -1_073_741_824;

// --------------------
// Control commands
// --------------------
pub const CMD_GETVERSION: u8 = 0x00;
pub const CMD_SIMSTEP: u8 = 0x02;
pub const CMD_CLOSE: u8 = 0x7f;

// --------------------
// Domain commands
// --------------------
pub const CMD_GET_VEHICLE_VARIABLE: u8 = 0xa4;
pub const RESPONSE_GET_VEHICLE_VARIABLE: u8 = 0xb4;
pub const CMD_SET_VEHICLE_VARIABLE: u8 = 0xc4;

pub const CMD_GET_VEHICLETYPE_VARIABLE: u8 = 0xa5;
pub const RESPONSE_GET_VEHICLETYPE_VARIABLE: u8 = 0xb5;
pub const CMD_SET_VEHICLETYPE_VARIABLE: u8 = 0xc5;

// --------------------
// Type tags
// --------------------
pub const POSITION_2D: u8 = 0x01;
pub const POSITION_3D: u8 = 0x03;
pub const POSITION_ROADMAP: u8 = 0x04;
pub const TYPE_UBYTE: u8 = 0x07;
pub const TYPE_BYTE: u8 = 0x08;
pub const TYPE_INTEGER: u8 = 0x09;
pub const TYPE_DOUBLE: u8 = 0x0b;
pub const TYPE_STRING: u8 = 0x0c;
pub const TYPE_STRINGLIST: u8 = 0x0e;
pub const TYPE_COMPOUND: u8 = 0x0f;
pub const TYPE_COLOR: u8 = 0x11;

// --------------------
// Variables (vehicle + vehicle type)
// --------------------
pub const ID_LIST: u8 = 0x00;
pub const ID_COUNT: u8 = 0x01;

pub const CMD_STOP: u8 = 0x12;
pub const CMD_CHANGELANE: u8 = 0x13;
pub const CMD_SLOWDOWN: u8 = 0x14;
pub const CMD_RESUME: u8 = 0x19;
pub const CMD_CHANGETARGET: u8 = 0x31;

pub const VAR_POSITION3D: u8 = 0x39;
pub const VAR_SPEED: u8 = 0x40;
pub const VAR_MAXSPEED: u8 = 0x41;
pub const VAR_POSITION: u8 = 0x42;
pub const VAR_ANGLE: u8 = 0x43;
pub const VAR_LENGTH: u8 = 0x44;
pub const VAR_COLOR: u8 = 0x45;
pub const VAR_ACCEL: u8 = 0x46;
pub const VAR_DECEL: u8 = 0x47;
pub const VAR_TAU: u8 = 0x48;
pub const VAR_VEHICLECLASS: u8 = 0x49;
pub const VAR_EMISSIONCLASS: u8 = 0x4a;
pub const VAR_SHAPECLASS: u8 = 0x4b;
pub const VAR_MINGAP: u8 = 0x4c;
pub const VAR_WIDTH: u8 = 0x4d;
pub const VAR_TYPE: u8 = 0x4f;
pub const VAR_ROAD_ID: u8 = 0x50;
pub const VAR_LANE_ID: u8 = 0x51;
pub const VAR_LANE_INDEX: u8 = 0x52;
pub const VAR_ROUTE_ID: u8 = 0x53;
pub const VAR_EDGES: u8 = 0x54;
pub const VAR_LANEPOSITION: u8 = 0x56;
pub const VAR_ROUTE: u8 = 0x57;
pub const VAR_EDGE_TRAVELTIME: u8 = 0x58;
pub const VAR_EDGE_EFFORT: u8 = 0x59;
pub const VAR_SIGNALS: u8 = 0x5b;
pub const VAR_MOVE_TO: u8 = 0x5c;
pub const VAR_IMPERFECTION: u8 = 0x5d;
pub const VAR_SPEED_FACTOR: u8 = 0x5e;
pub const VAR_SPEED_DEVIATION: u8 = 0x5f;
pub const VAR_CO2EMISSION: u8 = 0x60;
pub const VAR_COEMISSION: u8 = 0x61;
pub const VAR_HCEMISSION: u8 = 0x62;
pub const VAR_PMXEMISSION: u8 = 0x63;
pub const VAR_NOXEMISSION: u8 = 0x64;
pub const VAR_FUELCONSUMPTION: u8 = 0x65;
pub const VAR_NOISEEMISSION: u8 = 0x66;
pub const VAR_PERSON_NUMBER: u8 = 0x67;
pub const VAR_LEADER: u8 = 0x68;
pub const VAR_WAITING_TIME: u8 = 0x7a;
pub const VAR_PARAMETER: u8 = 0x7e;
pub const ADD: u8 = 0x80;
pub const REMOVE: u8 = 0x81;
pub const DISTANCE_REQUEST: u8 = 0x83;
pub const VAR_DISTANCE: u8 = 0x84;
pub const ADD_FULL: u8 = 0x85;
pub const CMD_REROUTE_TRAVELTIME: u8 = 0x90;
pub const CMD_REROUTE_EFFORT: u8 = 0x91;
pub const VAR_ROUTE_VALID: u8 = 0x92;
pub const VAR_SPEED_WITHOUT_TRACI: u8 = 0xb1;
pub const VAR_BEST_LANES: u8 = 0xb2;
pub const VAR_SPEEDSETMODE: u8 = 0xb3;
pub const VAR_MOVE_TO_VTD: u8 = 0xb4;
pub const VAR_STOPSTATE: u8 = 0xb5;
pub const VAR_LANECHANGE_MODE: u8 = 0xb6;
pub const VAR_ALLOWED_SPEED: u8 = 0xb7;

// --------------------
// Removal reasons
// --------------------
pub const REMOVE_TELEPORT: u8 = 0x00;
pub const REMOVE_PARKING: u8 = 0x01;
pub const REMOVE_ARRIVED: u8 = 0x02;
pub const REMOVE_VAPORIZED: u8 = 0x03;
pub const REMOVE_TELEPORT_ARRIVED: u8 = 0x04;

// --------------------
// Distance request types
// --------------------
pub const REQUEST_AIRDIST: u8 = 0x00;
pub const REQUEST_DRIVINGDIST: u8 = 0x01;
