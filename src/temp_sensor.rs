/* Copyright (c) 2023 Kevin Hutto

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT,TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE. */

use std::io::Read;
use std::thread;
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort, SerialPortType};

//USB product string that identifies the sensor board during the port scan
const SENSOR_PRODUCT: &str = "Arduino";

//baud rate of the sensor board firmware
const SENSOR_BAUD: u32 = 115_200;

//upper bound on one blocking serial read
const READ_TIMEOUT: Duration = Duration::from_millis(5000);

//settling time between the stale-data flush and the fresh read
const FRESH_DATA_WAIT: Duration = Duration::from_millis(2500);

//scans the available serial ports for the sensor board
pub fn find_sensor_port() -> Result<Option<String>, serialport::Error> {
    let ports = serialport::available_ports()?;
    for info in ports {
        if let SerialPortType::UsbPort(usb) = &info.port_type {
            if usb
                .product
                .as_deref()
                .map_or(false, |product| product.contains(SENSOR_PRODUCT))
            {
                return Ok(Some(info.port_name));
            }
        }
    }
    Ok(None)
}

pub fn open_sensor_port(port_name: &str) -> Result<Box<dyn SerialPort>, serialport::Error> {
    serialport::new(port_name, SENSOR_BAUD)
        .timeout(READ_TIMEOUT)
        .open()
}

//Reads one buffer of fresh data from the sensor board. The board transmits
//continuously, so everything buffered since the last cycle is stale and gets
//flushed first.
pub fn read_serial_ext(port: &mut Box<dyn SerialPort>) -> std::io::Result<Vec<u8>> {
    port.clear(ClearBuffer::Input)?;
    thread::sleep(FRESH_DATA_WAIT);

    let mut frame = Vec::new();
    let mut chunk = [0u8; 64];

    //first read blocks until data is ready or the timeout elapses
    let n = port.read(&mut chunk)?;
    frame.extend_from_slice(&chunk[..n]);

    //drain whatever else already arrived
    while port.bytes_to_read()? > 0 {
        let n = port.read(&mut chunk)?;
        frame.extend_from_slice(&chunk[..n]);
    }

    Ok(frame)
}
